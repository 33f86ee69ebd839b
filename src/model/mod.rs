//! Ledger types as returned by `getBlock` with `transactionDetails: "full"`
//! and JSON transaction encoding.

use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Not part of the RPC payload; filled in by the block source.
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub blockhash: String,
    #[serde(default)]
    pub parent_slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub transactions: Vec<BlockTransaction>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BlockTransaction {
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: Transaction,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    pub fee: u64,
    #[serde(default)]
    pub loaded_addresses: Option<LoadedAddresses>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LoadedAddresses {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readonly: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub signatures: Vec<String>,
    pub message: Message,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub header: Option<Header>,
    pub account_keys: Vec<String>,
    #[serde(default)]
    pub recent_blockhash: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    /// Base58 encoded instruction data.
    pub data: String,
    #[serde(default)]
    pub stack_height: Option<u32>,
}

impl BlockTransaction {
    /// Resolves an account index the way the runtime does: static keys first,
    /// then loaded writable addresses, then loaded read-only addresses.
    pub fn account_key(&self, index: usize) -> Option<&str> {
        let static_keys = &self.transaction.message.account_keys;
        if let Some(key) = static_keys.get(index) {
            return Some(key.as_str());
        }

        let loaded = self.meta.as_ref()?.loaded_addresses.as_ref()?;
        let index = index - static_keys.len();

        let key = match index.checked_sub(loaded.writable.len()) {
            None => loaded.writable.get(index),
            Some(readonly_index) => loaded.readonly.get(readonly_index),
        };

        key.map(String::as_str)
    }

    pub fn account_keys_len(&self) -> usize {
        let loaded = self
            .meta
            .as_ref()
            .and_then(|meta| meta.loaded_addresses.as_ref())
            .map(|loaded| loaded.writable.len() + loaded.readonly.len())
            .unwrap_or(0);

        self.transaction.message.account_keys.len() + loaded
    }

    /// The first signature identifies the transaction.
    pub fn signature(&self) -> Option<&str> {
        self.transaction.signatures.first().map(String::as_str)
    }
}
