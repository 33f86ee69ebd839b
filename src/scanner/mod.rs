//! Finds bridge instructions in a block and decodes their payloads.
//!
//! A structural problem with the block (an instruction pointing past the end
//! of its transaction's account keys) aborts the scan of that block. A bad
//! payload on a matching instruction only costs that instruction: the
//! failure is logged, kept in the report and scanning carries on.

use thiserror::Error;

use crate::instruction::{BridgeInstruction, DecodeError, TransferOutData};
use crate::logs;
use crate::model::{Block, BlockTransaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscriminatorPolicy {
    /// The discriminator selects the instruction; unknown values are errors.
    #[default]
    Strict,
    /// Drop the leading byte whatever it is and decode a transfer-out record.
    Unchecked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionLocation {
    pub transaction_index: usize,
    pub instruction_index: usize,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedInstruction {
    pub location: InstructionLocation,
    pub instruction: BridgeInstruction,
}

#[derive(Debug)]
pub struct InstructionFailure {
    pub location: InstructionLocation,
    pub error: DecodeError,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub matched: Vec<MatchedInstruction>,
    pub failures: Vec<InstructionFailure>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScanError {
    #[error(
        "transaction {transaction_index} instruction {instruction_index}: program index {program_id_index} out of range ({account_keys} account keys)"
    )]
    ProgramIndexOutOfRange {
        transaction_index: usize,
        instruction_index: usize,
        program_id_index: u8,
        account_keys: usize,
    },
}

impl ScanReport {
    /// Transfer-out payloads in block order.
    pub fn transfers(&self) -> impl Iterator<Item = (&InstructionLocation, &TransferOutData)> {
        self.matched.iter().filter_map(|matched| match &matched.instruction {
            BridgeInstruction::TransferOut(data) => Some((&matched.location, data)),
            _ => None,
        })
    }

    pub fn into_transfers(self) -> Vec<TransferOutData> {
        self.matched
            .into_iter()
            .filter_map(|matched| match matched.instruction {
                BridgeInstruction::TransferOut(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.failures.is_empty()
    }
}

pub fn scan_block(
    block: &Block,
    program_id: &str,
    policy: DiscriminatorPolicy,
) -> Result<ScanReport, ScanError> {
    scan_transactions(&block.transactions, program_id, policy)
}

pub fn scan_transactions(
    transactions: &[BlockTransaction],
    program_id: &str,
    policy: DiscriminatorPolicy,
) -> Result<ScanReport, ScanError> {
    let mut report = ScanReport::default();

    for (transaction_index, tx) in transactions.iter().enumerate() {
        for (instruction_index, ix) in tx.transaction.message.instructions.iter().enumerate() {
            let program = tx
                .account_key(ix.program_id_index as usize)
                .ok_or_else(|| ScanError::ProgramIndexOutOfRange {
                    transaction_index,
                    instruction_index,
                    program_id_index: ix.program_id_index,
                    account_keys: tx.account_keys_len(),
                })?;

            if program != program_id {
                continue;
            }

            let location = InstructionLocation {
                transaction_index,
                instruction_index,
                signature: tx.signature().map(str::to_string),
            };

            match decode(&ix.data, policy) {
                Ok(instruction) => report.matched.push(MatchedInstruction { location, instruction }),
                Err(error) => {
                    logs::warn(&format!(
                        "Skipping instruction {}:{} ({}): {}",
                        transaction_index,
                        instruction_index,
                        location.signature.as_deref().unwrap_or("unsigned"),
                        error
                    ));
                    report.failures.push(InstructionFailure { location, error });
                }
            }
        }
    }

    Ok(report)
}

fn decode(data: &str, policy: DiscriminatorPolicy) -> Result<BridgeInstruction, DecodeError> {
    match policy {
        DiscriminatorPolicy::Strict => BridgeInstruction::from_base58(data),
        DiscriminatorPolicy::Unchecked => {
            TransferOutData::from_base58_unchecked(data).map(BridgeInstruction::TransferOut)
        }
    }
}
