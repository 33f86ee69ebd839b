use std::{env, fs, io, str::FromStr};

use serde_derive::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use thiserror::Error;

use crate::scanner::DiscriminatorPolicy;

pub const SETTINGS_ENV: &str = "BRIDGE_SCANNER_SETTINGS";
pub const DEFAULT_SETTINGS_PATH: &str = "./settings.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub rpc: String,
    pub program_id: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    pub start_block: u64,
    /// Follow the chain tip when absent.
    #[serde(default)]
    pub end_block: Option<u64>,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_strict")]
    pub strict_discriminator: bool,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("RPC url is empty")]
    EmptyRpc,

    #[error("program id {0} is not a valid public key")]
    InvalidProgramId(String),

    #[error("unknown commitment level {0}")]
    InvalidCommitment(String),

    #[error("commitment {0} is not supported by getBlock, use confirmed or finalized")]
    UnsupportedCommitment(String),

    #[error("end block {end} is before start block {start}")]
    InvalidRange { start: u64, end: u64 },

    #[error("retries must be at least 1")]
    NoRetries,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_retries() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    400
}

fn default_strict() -> bool {
    true
}

pub fn setup() -> Result<Settings, SettingsError> {
    // Point BRIDGE_SCANNER_SETTINGS at your own settings file to override the default location
    let file_path = env::var(SETTINGS_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    read_json_file(&file_path)
}

fn read_json_file(path: &str) -> Result<Settings, SettingsError> {
    let file_content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_string(),
        source,
    })?;

    Settings::from_json(&file_content)
}

impl Settings {
    pub fn from_json(content: &str) -> Result<Settings, SettingsError> {
        let settings = serde_json::from_str::<Settings>(content)?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.rpc.trim().is_empty() {
            return Err(SettingsError::EmptyRpc);
        }

        self.program_pubkey()?;
        self.commitment_config()?;

        if let Some(end) = self.end_block {
            if end < self.start_block {
                return Err(SettingsError::InvalidRange { start: self.start_block, end });
            }
        }

        if self.retries == 0 {
            return Err(SettingsError::NoRetries);
        }

        Ok(())
    }

    pub fn program_pubkey(&self) -> Result<Pubkey, SettingsError> {
        Pubkey::from_str(&self.program_id).map_err(|_| SettingsError::InvalidProgramId(self.program_id.clone()))
    }

    /// Blocks are only served at `confirmed` or above.
    pub fn commitment_config(&self) -> Result<CommitmentConfig, SettingsError> {
        match self.commitment.as_str() {
            "processed" => Err(SettingsError::UnsupportedCommitment(self.commitment.clone())),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(SettingsError::InvalidCommitment(other.to_string())),
        }
    }

    pub fn discriminator_policy(&self) -> DiscriminatorPolicy {
        if self.strict_discriminator {
            DiscriminatorPolicy::Strict
        } else {
            DiscriminatorPolicy::Unchecked
        }
    }
}
