//! Minimal in-memory proof-of-work ledger.
//!
//! Transactions are buffered, cut into blocks of `batch_size`, mined one at a
//! time on top of the current tip and appended to an append-only chain.
//! Balances are derived by replaying the chain.

pub mod block;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod hash;
pub mod ledger;
pub mod pow;
pub mod transaction;

pub use block::Block;
pub use config::{GenesisCredit, LedgerConfig};
pub use error::{ChainViolation, LedgerError, Result};
pub use events::{LedgerEvent, Notifier};
pub use ledger::{genesis_block, Ledger, MineOutcome};
pub use pow::{MiningLimits, MiningReport};
pub use transaction::Transaction;
