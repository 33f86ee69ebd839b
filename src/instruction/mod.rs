//! Bridge program instructions.
//!
//! Instruction data is a one-byte discriminator followed by the borsh
//! encoding of the variant's record.

use std::io;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
};
use solana_sdk::bs58;
use thiserror::Error;

pub const BRIDGE_SEED: &[u8] = b"SisuBridge";

pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Payload of a `TransferOut` instruction: tokens locked on this chain to be
/// released to `recipient` on `chain_id`.
#[derive(BorshSerialize, BorshDeserialize, PartialEq, Eq, Debug, Clone)]
pub struct TransferOutData {
    pub amount: u128,
    pub token_address: String,
    pub chain_id: u64,
    pub recipient: String,
}

#[derive(BorshSerialize, BorshDeserialize, PartialEq, Eq, Debug, Clone)]
pub struct TransferInData {
    pub amount: u128,
}

#[derive(BorshSerialize, BorshDeserialize, PartialEq, Eq, Debug, Clone)]
pub struct AddSpenderData {
    pub spender: [u8; 32],
}

impl AddSpenderData {
    pub fn spender(&self) -> Pubkey {
        Pubkey::new_from_array(self.spender)
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum BridgeInstruction {
    Initialize,
    TransferOut(TransferOutData),
    TransferIn(TransferInData),
    AddSpender(AddSpenderData),
    RemoveSpender,
    ChangeAdmin,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("instruction data is not valid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("instruction data is empty")]
    Empty,

    #[error("unknown instruction discriminator {0}")]
    UnknownInstruction(u8),

    #[error("malformed {instruction} payload: {source}")]
    Payload {
        instruction: &'static str,
        #[source]
        source: io::Error,
    },
}

impl BridgeInstruction {
    pub const INITIALIZE: u8 = 0;
    pub const TRANSFER_OUT: u8 = 1;
    pub const TRANSFER_IN: u8 = 2;
    pub const ADD_SPENDER: u8 = 3;
    pub const REMOVE_SPENDER: u8 = 4;
    pub const CHANGE_ADMIN: u8 = 5;

    pub fn discriminator(&self) -> u8 {
        match self {
            BridgeInstruction::Initialize => Self::INITIALIZE,
            BridgeInstruction::TransferOut(_) => Self::TRANSFER_OUT,
            BridgeInstruction::TransferIn(_) => Self::TRANSFER_IN,
            BridgeInstruction::AddSpender(_) => Self::ADD_SPENDER,
            BridgeInstruction::RemoveSpender => Self::REMOVE_SPENDER,
            BridgeInstruction::ChangeAdmin => Self::CHANGE_ADMIN,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BridgeInstruction::Initialize => "Initialize",
            BridgeInstruction::TransferOut(_) => "TransferOut",
            BridgeInstruction::TransferIn(_) => "TransferIn",
            BridgeInstruction::AddSpender(_) => "AddSpender",
            BridgeInstruction::RemoveSpender => "RemoveSpender",
            BridgeInstruction::ChangeAdmin => "ChangeAdmin",
        }
    }

    /// Validates the discriminator, then decodes the record that follows it.
    ///
    /// Records must consume the remaining bytes exactly. Variants without a
    /// record ignore anything after the discriminator, as the program does.
    pub fn unpack(data: &[u8]) -> Result<Self, DecodeError> {
        let (&tag, rest) = data.split_first().ok_or(DecodeError::Empty)?;

        let instruction = match tag {
            Self::INITIALIZE => BridgeInstruction::Initialize,
            Self::TRANSFER_OUT => BridgeInstruction::TransferOut(decode_record(rest, "TransferOut")?),
            Self::TRANSFER_IN => BridgeInstruction::TransferIn(decode_record(rest, "TransferIn")?),
            Self::ADD_SPENDER => BridgeInstruction::AddSpender(decode_record(rest, "AddSpender")?),
            Self::REMOVE_SPENDER => BridgeInstruction::RemoveSpender,
            Self::CHANGE_ADMIN => BridgeInstruction::ChangeAdmin,
            other => return Err(DecodeError::UnknownInstruction(other)),
        };

        Ok(instruction)
    }

    pub fn from_base58(data: &str) -> Result<Self, DecodeError> {
        let bytes = bs58::decode(data).into_vec()?;
        Self::unpack(&bytes)
    }

    pub fn pack(&self) -> io::Result<Vec<u8>> {
        let mut data = vec![self.discriminator()];
        match self {
            BridgeInstruction::TransferOut(record) => record.serialize(&mut data)?,
            BridgeInstruction::TransferIn(record) => record.serialize(&mut data)?,
            BridgeInstruction::AddSpender(record) => record.serialize(&mut data)?,
            _ => {}
        }

        Ok(data)
    }

    pub fn to_base58(&self) -> io::Result<String> {
        Ok(bs58::encode(self.pack()?).into_string())
    }
}

impl TransferOutData {
    /// Drops exactly one leading byte without looking at it and decodes the
    /// rest as a transfer-out record.
    pub fn unpack_unchecked(data: &[u8]) -> Result<Self, DecodeError> {
        let (_, rest) = data.split_first().ok_or(DecodeError::Empty)?;
        decode_record(rest, "TransferOut")
    }

    pub fn from_base58_unchecked(data: &str) -> Result<Self, DecodeError> {
        let bytes = bs58::decode(data).into_vec()?;
        Self::unpack_unchecked(&bytes)
    }
}

fn decode_record<T: BorshDeserialize>(bytes: &[u8], instruction: &'static str) -> Result<T, DecodeError> {
    borsh::from_slice(bytes).map_err(|source| DecodeError::Payload { instruction, source })
}

pub fn bridge_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BRIDGE_SEED], program_id)
}

/// Builds a `TransferOut` instruction moving tokens from the user's token
/// account into the bridge's token account.
pub fn transfer_out(
    program_id: Pubkey,
    user: Pubkey,
    user_token_account: Pubkey,
    bridge_token_account: Pubkey,
    data: TransferOutData,
) -> io::Result<Instruction> {
    let (bridge_pda, _) = bridge_pda(&program_id);

    Ok(Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new_readonly(user, true),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new(user_token_account, false),
            AccountMeta::new(bridge_token_account, false),
            AccountMeta::new(bridge_pda, false),
        ],
        data: BridgeInstruction::TransferOut(data).pack()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TransferOutData {
        TransferOutData {
            amount: 900,
            token_address: "0x1234".to_string(),
            chain_id: 123,
            recipient: "someone".to_string(),
        }
    }

    #[test]
    fn test_transfer_out_layout() {
        let data = BridgeInstruction::TransferOut(sample()).pack().unwrap();

        let mut expected = vec![1u8];
        expected.extend_from_slice(&900u128.to_le_bytes());
        expected.extend_from_slice(&6u32.to_le_bytes());
        expected.extend_from_slice(b"0x1234");
        expected.extend_from_slice(&123u64.to_le_bytes());
        expected.extend_from_slice(&7u32.to_le_bytes());
        expected.extend_from_slice(b"someone");

        assert_eq!(data, expected);
    }

    #[test]
    fn test_round_trip_boundaries() {
        let cases = [
            TransferOutData {
                amount: 0,
                token_address: String::new(),
                chain_id: 0,
                recipient: String::new(),
            },
            TransferOutData {
                amount: u128::MAX,
                token_address: "0xdeadbeef".to_string(),
                chain_id: u64::MAX,
                recipient: "ünïcode recipient".to_string(),
            },
        ];

        for case in cases {
            let instruction = BridgeInstruction::TransferOut(case.clone());
            let decoded = BridgeInstruction::from_base58(&instruction.to_base58().unwrap()).unwrap();
            assert_eq!(decoded, BridgeInstruction::TransferOut(case));
        }
    }

    #[test]
    fn test_unknown_discriminator_is_rejected() {
        let mut data = BridgeInstruction::TransferOut(sample()).pack().unwrap();
        data[0] = 9;

        let err = BridgeInstruction::unpack(&data).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownInstruction(9)));
    }

    #[test]
    fn test_unchecked_ignores_discriminator_value() {
        let mut data = BridgeInstruction::TransferOut(sample()).pack().unwrap();
        data[0] = 9;

        assert_eq!(TransferOutData::unpack_unchecked(&data).unwrap(), sample());
    }

    #[test]
    fn test_unchecked_strips_exactly_one_byte() {
        let record = borsh::to_vec(&sample()).unwrap();

        // Without a leading byte the first amount byte is dropped instead.
        assert!(TransferOutData::unpack_unchecked(&record).is_err());
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut data = BridgeInstruction::TransferOut(sample()).pack().unwrap();
        data.push(0);

        let err = BridgeInstruction::unpack(&data).unwrap_err();
        assert!(matches!(err, DecodeError::Payload { instruction: "TransferOut", .. }));
    }

    #[test]
    fn test_pack_writes_discriminator_then_record() {
        let cases = [
            (BridgeInstruction::Initialize, 1),
            (BridgeInstruction::TransferIn(TransferInData { amount: 5 }), 17),
            (BridgeInstruction::AddSpender(AddSpenderData { spender: [7; 32] }), 33),
            (BridgeInstruction::RemoveSpender, 1),
            (BridgeInstruction::ChangeAdmin, 1),
        ];

        for (instruction, len) in cases {
            let packed = instruction.pack().unwrap();
            assert_eq!(packed.len(), len);
            assert_eq!(packed[0], instruction.discriminator());
            assert_eq!(BridgeInstruction::unpack(&packed).unwrap(), instruction);
        }
    }

    #[test]
    fn test_unit_variants_ignore_trailing_bytes() {
        assert_eq!(BridgeInstruction::unpack(&[0, 7, 7]).unwrap(), BridgeInstruction::Initialize);
        assert_eq!(BridgeInstruction::unpack(&[5]).unwrap(), BridgeInstruction::ChangeAdmin);
    }

    #[test]
    fn test_empty_and_bad_base58() {
        assert!(matches!(BridgeInstruction::unpack(&[]), Err(DecodeError::Empty)));
        assert!(matches!(BridgeInstruction::from_base58("0OIl"), Err(DecodeError::Base58(_))));
    }

    #[test]
    fn test_add_spender_round_trip() {
        let spender = Pubkey::new_unique();
        let instruction = BridgeInstruction::AddSpender(AddSpenderData { spender: spender.to_bytes() });
        let packed = instruction.pack().unwrap();

        assert_eq!(packed.len(), 33);
        match BridgeInstruction::unpack(&packed).unwrap() {
            BridgeInstruction::AddSpender(data) => assert_eq!(data.spender(), spender),
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn test_transfer_out_instruction_accounts() {
        let program_id = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let user_ata = Pubkey::new_unique();
        let bridge_ata = Pubkey::new_unique();

        let ix = transfer_out(program_id, user, user_ata, bridge_ata, sample()).unwrap();
        let (pda, _) = bridge_pda(&program_id);

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts[0], AccountMeta::new_readonly(user, true));
        assert_eq!(ix.accounts[1].pubkey, TOKEN_PROGRAM_ID);
        assert!(ix.accounts[2].is_writable && ix.accounts[3].is_writable);
        assert_eq!(ix.accounts[4], AccountMeta::new(pda, false));
        assert_eq!(TransferOutData::unpack_unchecked(&ix.data).unwrap(), sample());
    }
}
