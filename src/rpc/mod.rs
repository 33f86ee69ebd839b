//! Block retrieval over JSON-RPC.

use std::{thread::sleep, time::Duration};

use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    rpc_client::RpcClient,
    rpc_config::RpcBlockConfig,
    rpc_request::RpcError as RpcRequestError,
};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_transaction_status::{TransactionDetails, UiConfirmedBlock, UiTransactionEncoding};
use thiserror::Error;

use crate::logs;
use crate::model::Block;

pub const SLOT_SKIPPED: i64 = -32007;
pub const LONG_TERM_STORAGE_SLOT_SKIPPED: i64 = -32009;

const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: ClientError,
    },

    #[error("slot {0} was skipped")]
    SlotSkipped(u64),

    #[error("unexpected block shape: {0}")]
    Conversion(#[from] serde_json::Error),
}

/// Where blocks come from. Implemented over the RPC client for real runs and
/// by in-memory stubs in tests.
///
/// Calls block the current thread, retry delays included. `LedgerClient`
/// wraps the blocking `RpcClient`, which moves its own work off the async
/// worker with `block_in_place`, so callers on the multi-threaded runtime
/// keep the other workers free.
pub trait BlockSource {
    fn get_block(&self, slot: u64) -> Result<Block, RpcError>;

    fn latest_slot(&self) -> Result<u64, RpcError>;
}

pub struct LedgerClient {
    rpc: RpcClient,
    commitment: CommitmentConfig,
    retries: u32,
}

pub fn load_client(url: &str, commitment: CommitmentConfig) -> RpcClient {
    RpcClient::new_with_commitment(url.to_string(), commitment)
}

impl LedgerClient {
    pub fn new(url: &str, commitment: CommitmentConfig, retries: u32) -> Self {
        LedgerClient {
            rpc: load_client(url, commitment),
            commitment,
            retries: retries.max(1),
        }
    }

    fn block_config(&self) -> RpcBlockConfig {
        RpcBlockConfig {
            encoding: Some(UiTransactionEncoding::Json),
            transaction_details: Some(TransactionDetails::Full),
            rewards: Some(false),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        }
    }

    fn with_retries<T>(
        &self,
        what: &str,
        call: impl FnMut() -> Result<T, ClientError>,
    ) -> Result<T, (u32, ClientError)> {
        retry_call(self.retries, RETRY_DELAY, what, call)
    }
}

/// Runs `call` up to `retries` times, sleeping `delay` between attempts.
/// Skipped-slot responses are returned at once. On failure the number of
/// attempts made is returned with the last error.
pub fn retry_call<T>(
    retries: u32,
    delay: Duration,
    what: &str,
    mut call: impl FnMut() -> Result<T, ClientError>,
) -> Result<T, (u32, ClientError)> {
    let retries = retries.max(1);
    let mut attempt = 1;

    loop {
        match call() {
            Ok(value) => return Ok(value),
            Err(e) if is_slot_skipped(&e) || attempt >= retries => return Err((attempt, e)),
            Err(e) => {
                logs::warn(&format!("Retrying {} ({}/{}): {}", what, attempt, retries, e));
                attempt += 1;
                sleep(delay);
            }
        }
    }
}

impl BlockSource for LedgerClient {
    fn get_block(&self, slot: u64) -> Result<Block, RpcError> {
        let config = self.block_config();

        match self.with_retries("getting block", || self.rpc.get_block_with_config(slot, config.clone())) {
            Ok(block) => block_from_ui(slot, &block),
            Err((_, e)) if is_slot_skipped(&e) => Err(RpcError::SlotSkipped(slot)),
            Err((attempts, source)) => Err(RpcError::Transport { attempts, source }),
        }
    }

    fn latest_slot(&self) -> Result<u64, RpcError> {
        self.with_retries("getting slot", || self.rpc.get_slot_with_commitment(self.commitment))
            .map_err(|(attempts, source)| RpcError::Transport { attempts, source })
    }
}

fn is_slot_skipped(err: &ClientError) -> bool {
    matches!(
        err.kind(),
        ClientErrorKind::RpcError(RpcRequestError::RpcResponseError { code, .. })
            if *code == SLOT_SKIPPED || *code == LONG_TERM_STORAGE_SLOT_SKIPPED
    )
}

pub fn block_from_ui(slot: u64, block: &UiConfirmedBlock) -> Result<Block, RpcError> {
    let value = serde_json::to_value(block)?;
    block_from_value(slot, value)
}

/// Reads a `getBlock` result (JSON encoding, full transaction details).
pub fn block_from_value(slot: u64, value: serde_json::Value) -> Result<Block, RpcError> {
    let mut block = serde_json::from_value::<Block>(value)?;
    block.slot = slot;

    Ok(block)
}
