use crate::{
    constants::{DEFAULT_BATCH_SIZE, DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, HASH_HEX_SIZE},
    LedgerError, Result,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Coins credited in the genesis block to bootstrap supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisCredit {
    pub recipient: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading zero hex characters required in a mined digest.
    pub difficulty: usize,
    /// Pending transactions that make up one block.
    pub batch_size: usize,
    pub mining_reward: u64,
    pub genesis_credit: Option<GenesisCredit>,
    /// Per-block cap on digest attempts. `None` searches forever.
    pub max_attempts: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            batch_size: DEFAULT_BATCH_SIZE,
            mining_reward: DEFAULT_MINING_REWARD,
            genesis_credit: None,
            max_attempts: None,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(LedgerError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.difficulty > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty {} exceeds digest length {}",
                self.difficulty, HASH_HEX_SIZE
            )));
        }
        Ok(())
    }
}
