//! Block digest.
//!
//! The digest input is the concatenation of
//!
//! ```text
//! index            u64 LE
//! previous_hash    u64 LE length || UTF-8 bytes
//! timestamp        u64 LE
//! transactions     encode_transactions(..)
//! nonce            u64 LE
//! ```
//!
//! hashed with SHA-256 and rendered as 64 lowercase hex characters.

use crate::Transaction;
use sha2::{Digest, Sha256};

const NO_SENDER: u8 = 0;
const SENDER: u8 = 1;

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Canonical encoding of an ordered transaction list.
///
/// Layout: the count as u64 LE, then per transaction a sender tag byte
/// (0 = minted, 1 = followed by the length-prefixed sender), the
/// length-prefixed recipient and the amount as u64 LE. Every string is
/// length-prefixed so field boundaries cannot be shifted between neighbours.
pub fn encode_transactions(txs: &[Transaction]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + txs.len() * 48);
    out.extend_from_slice(&(txs.len() as u64).to_le_bytes());
    for tx in txs {
        match &tx.from {
            Some(from) => {
                out.push(SENDER);
                put_bytes(&mut out, from.as_bytes());
            }
            None => out.push(NO_SENDER),
        }
        put_bytes(&mut out, tx.to.as_bytes());
        out.extend_from_slice(&tx.amount.to_le_bytes());
    }
    out
}

pub fn hash_bytes(
    index: u64,
    previous_hash: &str,
    timestamp: u64,
    txs: &[Transaction],
    nonce: u64,
) -> Vec<u8> {
    let encoded = encode_transactions(txs);
    let mut bytes = Vec::with_capacity(8 + 8 + previous_hash.len() + 8 + encoded.len() + 8);
    bytes.extend_from_slice(&index.to_le_bytes());
    put_bytes(&mut bytes, previous_hash.as_bytes());
    bytes.extend_from_slice(&timestamp.to_le_bytes());
    bytes.extend_from_slice(&encoded);
    bytes.extend_from_slice(&nonce.to_le_bytes());
    bytes
}

pub fn block_hash(
    index: u64,
    previous_hash: &str,
    timestamp: u64,
    txs: &[Transaction],
    nonce: u64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash_bytes(index, previous_hash, timestamp, txs, nonce));
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HASH_HEX_SIZE;

    fn sample_txs() -> Vec<Transaction> {
        vec![
            Transaction::new("Alice", "Bob", 100),
            Transaction::new("Eva", "Alice", 50),
        ]
    }

    #[test]
    fn block_hash_example() {
        let hash = block_hash(1, "0", 1_600_000_000_000, &sample_txs(), 0);
        assert_eq!(hash.len(), HASH_HEX_SIZE);
        assert_eq!(
            hash,
            "045986f21d842f0090fc3de7b05d108743aab009a969be2de3f439f61b53adf5"
        );
    }

    #[test]
    fn encode_transactions_layout() {
        let bytes = encode_transactions(&[Transaction::reward("Mo", 7)]);
        let mut expected = Vec::new();
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.push(0);
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(b"Mo");
        expected.extend_from_slice(&7u64.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn empty_list_encodes_to_zero_count() {
        assert_eq!(encode_transactions(&[]), 0u64.to_le_bytes().to_vec());
    }

    #[test]
    fn block_hash_consistency() {
        let txs = sample_txs();
        let a = block_hash(3, "abc", 42, &txs, 9);
        let b = block_hash(3, "abc", 42, &txs, 9);
        assert_eq!(a, b);
    }

    #[test]
    fn transaction_order_changes_hash() {
        let txs = sample_txs();
        let mut reversed = txs.clone();
        reversed.reverse();
        assert_ne!(
            block_hash(1, "0", 42, &txs, 0),
            block_hash(1, "0", 42, &reversed, 0)
        );
        assert_ne!(encode_transactions(&txs), encode_transactions(&reversed));
    }

    #[test]
    fn every_transaction_field_changes_hash() {
        let base = block_hash(1, "0", 42, &sample_txs(), 0);

        let mut txs = sample_txs();
        txs[1].amount = 51;
        assert_ne!(base, block_hash(1, "0", 42, &txs, 0));

        let mut txs = sample_txs();
        txs[0].to = "Bobby".to_string();
        assert_ne!(base, block_hash(1, "0", 42, &txs, 0));

        let mut txs = sample_txs();
        txs[0].from = None;
        assert_ne!(base, block_hash(1, "0", 42, &txs, 0));
    }

    #[test]
    fn header_fields_change_hash() {
        let txs = sample_txs();
        let base = block_hash(1, "0", 42, &txs, 0);
        assert_ne!(base, block_hash(2, "0", 42, &txs, 0));
        assert_ne!(base, block_hash(1, "1", 42, &txs, 0));
        assert_ne!(base, block_hash(1, "0", 43, &txs, 0));
        assert_ne!(base, block_hash(1, "0", 42, &txs, 1));
    }

    #[test]
    fn string_boundaries_are_unambiguous() {
        let a = [Transaction::new("ab", "c", 1)];
        let b = [Transaction::new("a", "bc", 1)];
        assert_ne!(encode_transactions(&a), encode_transactions(&b));
    }
}
