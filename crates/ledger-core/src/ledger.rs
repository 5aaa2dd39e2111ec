use crate::{
    config::GenesisCredit,
    constants::GENESIS_PREVIOUS_HASH,
    events::{LedgerEvent, Notifier},
    pow::{self, MiningLimits, MiningReport},
    Block, ChainViolation, LedgerConfig, LedgerError, Result, Transaction,
};
use std::{collections::VecDeque, fmt, mem, sync::atomic::AtomicBool};
use tracing::{debug, info, warn};

/// What a call to [`Ledger::mine_pending_block`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MineOutcome {
    Mined(MiningReport),
    NothingToMine,
}

/// The genesis block: position 0, predecessor `"0"`, never mined.
pub fn genesis_block(credit: Option<&GenesisCredit>) -> Block {
    let txs = credit
        .map(|c| vec![Transaction::reward(c.recipient.clone(), c.amount)])
        .unwrap_or_default();
    Block::new(0, txs, GENESIS_PREVIOUS_HASH)
}

/// In-memory chain plus the staging areas in front of it.
///
/// Transactions go into a pending buffer; once it holds `batch_size` entries
/// the whole buffer becomes a pending block. Mining takes pending blocks in
/// submission order, links each to the current tip and appends it.
///
/// All mutation goes through `&mut self`, so sharing a ledger across threads
/// needs a lock around the whole value.
pub struct Ledger {
    chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
    pending_blocks: VecDeque<Block>,
    config: LedgerConfig,
    notifier: Option<Notifier>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("chain", &self.chain)
            .field("pending_transactions", &self.pending_transactions)
            .field("pending_blocks", &self.pending_blocks)
            .field("config", &self.config)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl Ledger {
    /// Ledger with the given difficulty and default batch size and reward.
    pub fn new(difficulty: usize) -> Result<Self> {
        Self::with_config(LedgerConfig::with_difficulty(difficulty))
    }

    pub fn with_config(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let genesis = genesis_block(config.genesis_credit.as_ref());
        info!(
            difficulty = config.difficulty,
            batch_size = config.batch_size,
            "ledger created with genesis {}",
            genesis.hash
        );
        Ok(Self {
            chain: vec![genesis],
            pending_transactions: Vec::new(),
            pending_blocks: VecDeque::new(),
            config,
            notifier: None,
        })
    }

    /// Register a callback that receives every [`LedgerEvent`].
    pub fn with_notifier<F>(mut self, notifier: F) -> Self
    where
        F: Fn(&LedgerEvent) + Send + Sync + 'static,
    {
        self.notifier = Some(Box::new(notifier));
        self
    }

    fn notify(&self, event: LedgerEvent) {
        if let Some(notifier) = &self.notifier {
            notifier(&event);
        }
    }

    pub fn latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always holds the genesis block")
    }

    /// Buffer a transaction, cutting a pending block once the buffer is full.
    ///
    /// The whole buffer is cut, including the reward left there by the last
    /// mined block, so with `batch_size == 1` the block following a mined one
    /// holds the reward plus the submitted transaction.
    pub fn create_transaction(&mut self, tx: Transaction) {
        debug!(from = ?tx.from, to = %tx.to, amount = tx.amount, "transaction submitted");
        self.notify(LedgerEvent::TransactionSubmitted(tx.clone()));
        self.pending_transactions.push(tx);

        if self.pending_transactions.len() >= self.config.batch_size {
            let txs = mem::take(&mut self.pending_transactions);
            let transactions = txs.len();
            self.pending_blocks.push_back(Block::pending(txs));
            debug!(
                transactions,
                queued = self.pending_blocks.len(),
                "pending block cut"
            );
            self.notify(LedgerEvent::BlockQueued { transactions });
        }
    }

    /// Mine the oldest pending block and pay `reward_address`.
    ///
    /// Blocks the calling thread until the proof of work is found, or until
    /// the configured `max_attempts` runs out.
    pub fn mine_pending_block(&mut self, reward_address: &str) -> Result<MineOutcome> {
        self.mine_pending_block_with(reward_address, None)
    }

    /// Like [`Ledger::mine_pending_block`], but gives up once `cancel` is set.
    ///
    /// A block whose search stops early goes back to the front of the queue.
    pub fn mine_pending_block_with(
        &mut self,
        reward_address: &str,
        cancel: Option<&AtomicBool>,
    ) -> Result<MineOutcome> {
        let Some(mut block) = self.pending_blocks.pop_front() else {
            warn!("no pending blocks to mine");
            self.notify(LedgerEvent::NothingToMine);
            return Ok(MineOutcome::NothingToMine);
        };

        let report = match self.mine_onto_tip(&mut block, cancel) {
            Ok(report) => report,
            Err(err) => {
                self.pending_blocks.push_front(block);
                return Err(err);
            }
        };

        self.chain.push(block);
        if !self.pending_transactions.is_empty() {
            warn!(
                dropped = self.pending_transactions.len(),
                "pending buffer replaced by mining reward"
            );
        }
        self.pending_transactions = vec![Transaction::reward(
            reward_address,
            self.config.mining_reward,
        )];
        self.notify(LedgerEvent::BlockMined(report.clone()));
        Ok(MineOutcome::Mined(report))
    }

    /// Link a caller-built block to the tip, mine it and append it.
    ///
    /// The block's index and previous hash are overwritten. The pending buffer
    /// and queue are not touched. If the search stops early the block is
    /// dropped and the chain is unchanged.
    pub fn add_block(&mut self, mut block: Block) -> Result<MiningReport> {
        let report = self.mine_onto_tip(&mut block, None)?;
        self.chain.push(block);
        self.notify(LedgerEvent::BlockMined(report.clone()));
        Ok(report)
    }

    fn mine_onto_tip(&self, block: &mut Block, cancel: Option<&AtomicBool>) -> Result<MiningReport> {
        let index = self.chain.len() as u64;
        block.bind(index, &self.latest_block().hash);

        let limits = MiningLimits {
            max_attempts: self.config.max_attempts,
            cancel,
        };
        pow::mine_with(block, self.config.difficulty, &limits).inspect_err(|err| {
            warn!(index, "mining stopped: {err}");
        })
    }

    /// Net balance of `address`, replayed from genesis.
    pub fn get_balance(&self, address: &str) -> i128 {
        let mut balance = 0i128;
        for tx in self.chain.iter().flat_map(|b| b.transactions.iter()) {
            if tx.from.as_deref() == Some(address) {
                balance -= i128::from(tx.amount);
            }
            if tx.to == address {
                balance += i128::from(tx.amount);
            }
        }
        balance
    }

    pub fn is_chain_valid(&self) -> bool {
        self.verify().is_ok()
    }

    /// Walk the chain from block 1 and report the first broken block.
    /// The genesis block itself is not checked.
    pub fn verify(&self) -> Result<()> {
        for pair in self.chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if !current.has_valid_hash() {
                return Err(LedgerError::InvalidChain {
                    index: current.index,
                    reason: ChainViolation::HashMismatch,
                });
            }
            if current.previous_hash != previous.hash {
                return Err(LedgerError::InvalidChain {
                    index: current.index,
                    reason: ChainViolation::BrokenLink,
                });
            }
        }
        Ok(())
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false; the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn pending_blocks(&self) -> impl ExactSizeIterator<Item = &Block> {
        self.pending_blocks.iter()
    }

    pub fn has_pending_blocks(&self) -> bool {
        !self.pending_blocks.is_empty()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    pub fn mining_reward(&self) -> u64 {
        self.config.mining_reward
    }
}
