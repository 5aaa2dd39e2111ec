use crate::{
    hash::block_hash,
    pow::{self, MiningReport},
    Transaction,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. A clock set before 1970 reads as 0.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// An ordered batch of transactions chained to its predecessor by digest.
///
/// `hash` always equals [`Block::calculate_hash`] once the block is on the
/// chain; it only lags behind while the nonce search is running.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: u64,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) previous_hash: String,
    pub(crate) hash: String,
    pub(crate) nonce: u64,
}

impl Block {
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: impl Into<String>) -> Self {
        let mut block = Self {
            index,
            timestamp: unix_millis(),
            transactions,
            previous_hash: previous_hash.into(),
            hash: String::new(),
            nonce: 0,
        };
        block.hash = block.calculate_hash();
        block
    }

    /// A block cut from the pending buffer. Its position and predecessor are
    /// bound later, right before mining.
    pub fn pending(transactions: Vec<Transaction>) -> Self {
        Self::new(0, transactions, String::new())
    }

    pub fn calculate_hash(&self) -> String {
        block_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.transactions,
            self.nonce,
        )
    }

    /// Searches nonces until the digest starts with `difficulty` zeros.
    /// Blocks the calling thread for as long as that takes.
    pub fn mine(&mut self, difficulty: usize) -> MiningReport {
        pow::mine(self, difficulty)
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        pow::meets_difficulty(&self.hash, difficulty)
    }

    /// Places the block at `index` after `previous_hash` and refreshes the digest.
    pub(crate) fn bind(&mut self, index: u64, previous_hash: &str) {
        self.index = index;
        self.previous_hash = previous_hash.to_string();
        self.hash = self.calculate_hash();
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HASH_HEX_SIZE;

    fn sample_block() -> Block {
        let txs = vec![
            Transaction::new("Alice", "Bob", 10),
            Transaction::new("Bob", "Charlie", 5),
        ];
        let mut block = Block::new(1, txs, "0");
        block.timestamp = 1_600_000_200_000; // Fix timestamp for test consistency
        block.hash = block.calculate_hash();
        block
    }

    #[test]
    fn new_block_starts_at_nonce_zero_with_valid_hash() {
        let block = Block::new(1, vec![Transaction::new("Alice", "Bob", 10)], "prev");
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_hash(), "prev");
        assert_eq!(block.hash().len(), HASH_HEX_SIZE);
        assert!(block.has_valid_hash());
        assert!(block.timestamp() > 0);
    }

    #[test]
    fn block_hash_matches_hasher() {
        let block = sample_block();
        assert_eq!(
            block.hash(),
            block_hash(1, "0", 1_600_000_200_000, block.transactions(), 0)
        );
    }

    #[test]
    fn block_hash_changes_with_nonce() {
        let mut block = sample_block();
        let hash1 = block.calculate_hash();
        block.nonce += 1;
        let hash2 = block.calculate_hash();
        assert_ne!(hash1, hash2);
        assert!(!block.has_valid_hash());
    }

    #[test]
    fn pending_block_has_no_predecessor_until_bound() {
        let mut block = Block::pending(vec![Transaction::new("Alice", "Bob", 1)]);
        assert_eq!(block.previous_hash(), "");
        let before = block.hash().to_string();

        block.bind(4, "abc");
        assert_eq!(block.index(), 4);
        assert_eq!(block.previous_hash(), "abc");
        assert_ne!(block.hash(), before);
        assert!(block.has_valid_hash());
    }

    #[test]
    fn mine_block_example() {
        let mut block = sample_block();
        let report = block.mine(2);
        assert!(block.hash().starts_with("00"));
        assert!(block.meets_difficulty(2));
        assert!(block.has_valid_hash());
        assert_eq!(report.nonce, block.nonce());
        assert_eq!(report.hash, block.hash());
    }

    #[test]
    fn block_serialization_example() {
        let block = sample_block();
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
        assert!(back.has_valid_hash());
    }
}
