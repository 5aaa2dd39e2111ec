use crate::{pow::MiningReport, Transaction};

/// Something the ledger did that a caller may want to hear about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    TransactionSubmitted(Transaction),
    /// The pending buffer reached the batch size and was cut into a block.
    BlockQueued { transactions: usize },
    BlockMined(MiningReport),
    /// `mine_pending_block` found an empty queue.
    NothingToMine,
}

pub type Notifier = Box<dyn Fn(&LedgerEvent) + Send + Sync>;
