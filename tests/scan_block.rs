use bridge_scanner::{
    instruction::{AddSpenderData, BridgeInstruction, DecodeError, TransferOutData},
    rpc::block_from_value,
    scan_block, Block, DiscriminatorPolicy,
};
use serde_json::json;

const PROGRAM_ID: &str = "HguMTvmDfspHuEWycDSP1XtVQJi47hVNAyLbFEf2EJEQ";

fn fixture_block() -> Block {
    let value = serde_json::from_str(include_str!("fixtures/block.json")).unwrap();
    block_from_value(170525051, value).unwrap()
}

fn transfer(amount: u128, token_address: &str, chain_id: u64, recipient: &str) -> TransferOutData {
    TransferOutData {
        amount,
        token_address: token_address.to_string(),
        chain_id,
        recipient: recipient.to_string(),
    }
}

#[test]
fn test_concrete_transfer_out_scenario() {
    let block: Block = serde_json::from_value(json!({
        "transactions": [{
            "meta": { "fee": 5000 },
            "transaction": {
                "signatures": ["sig"],
                "message": {
                    "accountKeys": ["Addr1", "ProgramXYZ"],
                    "instructions": [{
                        "programIdIndex": 1,
                        "accounts": [],
                        "data": "AbqDmMMnLcUsejkCuY1dZddDGvpYRh5A1eDLNE1QUyVebcfd5PmsXuKovMk3sr"
                    }]
                }
            }
        }]
    }))
    .unwrap();

    let report = scan_block(&block, "ProgramXYZ", DiscriminatorPolicy::Strict).unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.into_transfers(), vec![transfer(900, "0x1234", 123, "someone")]);
}

#[test]
fn test_fixture_block_strict() {
    let block = fixture_block();
    let report = scan_block(&block, PROGRAM_ID, DiscriminatorPolicy::Strict).unwrap();

    let transfers: Vec<_> = report
        .transfers()
        .map(|(location, data)| (location.transaction_index, location.instruction_index, data.clone()))
        .collect();
    assert_eq!(
        transfers,
        vec![
            (0, 1, transfer(900, "0x1234", 123, "someone")),
            (1, 0, transfer(250000, "0xabcd", 1, "alice")),
        ]
    );

    let spender: [u8; 32] = core::array::from_fn(|i| i as u8);
    assert_eq!(report.matched.len(), 3);
    assert_eq!(
        report.matched[2].instruction,
        BridgeInstruction::AddSpender(AddSpenderData { spender })
    );

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].location.transaction_index, 1);
    assert_eq!(report.failures[0].location.instruction_index, 2);
    assert!(matches!(report.failures[0].error, DecodeError::UnknownInstruction(7)));
}

#[test]
fn test_fixture_block_unchecked() {
    let block = fixture_block();
    let report = scan_block(&block, PROGRAM_ID, DiscriminatorPolicy::Unchecked).unwrap();

    // The AddSpender record is too short to read as a transfer.
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].location.instruction_index, 1);
    assert!(matches!(report.failures[0].error, DecodeError::Payload { .. }));
    assert_eq!(
        report.into_transfers(),
        vec![
            transfer(900, "0x1234", 123, "someone"),
            transfer(250000, "0xabcd", 1, "alice"),
            transfer(1, "x", 1, "y"),
        ]
    );
}

#[test]
fn test_fixture_block_other_program() {
    let block = fixture_block();
    let report = scan_block(&block, "Vote111111111111111111111111111111111111111", DiscriminatorPolicy::Strict).unwrap();

    assert!(report.matched.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, DecodeError::UnknownInstruction(0x58)));
}
