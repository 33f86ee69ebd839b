//! Scans ledger blocks for bridge program instructions and decodes their
//! transfer payloads.

pub mod cli;
pub mod instruction;
pub mod logs;
pub mod model;
pub mod monitor;
pub mod rpc;
pub mod scanner;
pub mod settings;

pub use instruction::{BridgeInstruction, DecodeError, TransferOutData};
pub use model::Block;
pub use scanner::{scan_block, scan_transactions, DiscriminatorPolicy, ScanError, ScanReport};
