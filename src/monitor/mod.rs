use std::error::Error;

use colored::Colorize;
use tokio::time::{sleep, Duration};

use crate::instruction::BridgeInstruction;
use crate::logs;
use crate::model::Block;
use crate::rpc::{BlockSource, LedgerClient, RpcError};
use crate::scanner::{self, ScanReport};
use crate::settings::Settings;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MonitorSummary {
    pub blocks_scanned: u64,
    pub slots_skipped: u64,
    pub blocks_aborted: u64,
    pub transfers: u64,
    pub failed_instructions: u64,
}

pub async fn start(settings: Settings) -> Result<(), Box<dyn Error>> {
    let client = LedgerClient::new(&settings.rpc, settings.commitment_config()?, settings.retries);

    logs::info(&format!("CONNECTED TO RPC {}", settings.rpc));
    logs::info(&format!("WATCHING PROGRAM {}", settings.program_id));

    let summary = run(&client, &settings).await?;
    print_summary(&summary);

    Ok(())
}

/// Scans `start_block..=end_block`, or keeps following the tip when no end
/// block is configured. Transport failures that survive the client's retries
/// stop the run; everything else is confined to the block it happened in.
pub async fn run<S: BlockSource>(source: &S, settings: &Settings) -> Result<MonitorSummary, RpcError> {
    let mut summary = MonitorSummary::default();
    let mut slot = settings.start_block;
    let poll_interval = Duration::from_millis(settings.poll_interval_ms);

    logs::info(&format!(
        "SCANNING FROM BLOCK {}{}",
        slot,
        settings.end_block.map(|end| format!(" TO {}", end)).unwrap_or_default()
    ));

    loop {
        match settings.end_block {
            Some(end) if slot > end => break,
            Some(_) => {}
            None => {
                if slot > source.latest_slot()? {
                    sleep(poll_interval).await;
                    continue;
                }
            }
        }

        match source.get_block(slot) {
            Ok(block) => process_block(&block, settings, &mut summary),
            Err(RpcError::SlotSkipped(skipped)) => {
                logs::warn(&format!("Slot {} was skipped", skipped));
                summary.slots_skipped += 1;
            }
            Err(e) => return Err(e),
        }

        slot = match slot.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(summary)
}

fn process_block(block: &Block, settings: &Settings, summary: &mut MonitorSummary) {
    match scanner::scan_block(block, &settings.program_id, settings.discriminator_policy()) {
        Ok(report) => {
            summary.blocks_scanned += 1;
            summary.transfers += report.transfers().count() as u64;
            summary.failed_instructions += report.failures.len() as u64;
            print_statements_manager(block, &report);
        }
        Err(e) => {
            logs::error(&format!("Block {} aborted: {}", block.slot, e));
            summary.blocks_aborted += 1;
        }
    }
}

fn print_statements_manager(block: &Block, report: &ScanReport) {
    for (location, transfer) in report.transfers() {
        println!("{}", "------------------------TransferOut----------------------".green());
        println!("Block: {} (height {:?})", block.slot, block.block_height);
        println!(
            "Signature: {} ",
            location.signature.as_deref().unwrap_or("unsigned")
        );
        println!("Instruction: {}:{}", location.transaction_index, location.instruction_index);
        println!("{}", "-------------------------Payload-------------------------".green());
        println!("Amount: {}", transfer.amount.to_string().bold());
        println!("Token address: {}", transfer.token_address);
        println!("Chain id: {}", transfer.chain_id);
        println!("Recipient: {}", transfer.recipient);
        println!("{}", "---------------------------------------------------------".green());
        println!("\n");
    }

    for matched in &report.matched {
        if !matches!(matched.instruction, BridgeInstruction::TransferOut(_)) {
            logs::info(&format!(
                "Block {} {}:{} {}",
                block.slot,
                matched.location.transaction_index,
                matched.location.instruction_index,
                matched.instruction.name()
            ));
        }
    }
}

fn print_summary(summary: &MonitorSummary) {
    logs::form_message(
        &format!(
            "Blocks scanned: {}, skipped slots: {}, aborted blocks: {}, transfers: {}, failed instructions: {}",
            summary.blocks_scanned,
            summary.slots_skipped,
            summary.blocks_aborted,
            summary.transfers,
            summary.failed_instructions
        ),
        crossterm::style::Color::Grey,
    );
}
