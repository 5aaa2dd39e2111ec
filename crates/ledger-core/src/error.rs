use std::fmt;
use thiserror::Error;

/// Why a block failed chain verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainViolation {
    /// Stored digest differs from the digest recomputed from the block's fields.
    HashMismatch,
    /// Stored previous digest differs from the predecessor's digest.
    BrokenLink,
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainViolation::HashMismatch => f.write_str("stored hash does not match block contents"),
            ChainViolation::BrokenLink => f.write_str("previous hash does not match predecessor"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("mining gave up after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    #[error("mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },

    #[error("invalid chain at block {index}: {reason}")]
    InvalidChain { index: u64, reason: ChainViolation },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
