use crate::{block::unix_millis, Block, LedgerError, Result};
use serde::Serialize;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};
use tracing::info;

/// Outcome of a successful nonce search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MiningReport {
    pub index: u64,
    pub hash: String,
    pub nonce: u64,
    /// Digests evaluated, the starting nonce included.
    pub attempts: u64,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
    pub elapsed: Duration,
}

/// Optional bounds on a nonce search. The default is unbounded.
#[derive(Clone, Copy, Debug, Default)]
pub struct MiningLimits<'a> {
    pub max_attempts: Option<u64>,
    pub cancel: Option<&'a AtomicBool>,
}

pub fn count_leading_zero_chars(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

/// True when the first `difficulty` characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.as_bytes()[..difficulty].iter().all(|b| *b == b'0')
}

/// Mine the block in place by incrementing the nonce until the digest has at
/// least `difficulty` leading zero characters.
///
/// There is no cap: the expected number of attempts is `16^difficulty`, and a
/// large enough difficulty never finishes.
pub fn mine(block: &mut Block, difficulty: usize) -> MiningReport {
    match mine_with(block, difficulty, &MiningLimits::default()) {
        Ok(report) => report,
        Err(_) => unreachable!("unbounded search never stops early"),
    }
}

/// Nonce search that stops early when `limits` say so.
///
/// On error the block keeps the nonce and digest of the last attempt, so
/// a later call resumes where this one stopped.
pub fn mine_with(block: &mut Block, difficulty: usize, limits: &MiningLimits<'_>) -> Result<MiningReport> {
    let started_at_ms = unix_millis();
    let start = Instant::now();
    let mut attempts = 1u64;

    while !meets_difficulty(&block.hash, difficulty) {
        if limits.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(LedgerError::MiningExhausted { attempts });
        }
        if limits.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(LedgerError::MiningCancelled { attempts });
        }
        block.nonce = block.nonce.wrapping_add(1);
        block.hash = block.calculate_hash();
        attempts += 1;
    }

    Ok(finish(block, attempts, started_at_ms, start))
}

fn finish(block: &Block, attempts: u64, started_at_ms: u64, start: Instant) -> MiningReport {
    let elapsed = start.elapsed();
    info!(
        index = block.index,
        nonce = block.nonce,
        attempts,
        elapsed_ms = elapsed.as_millis() as u64,
        "block mined: {}",
        block.hash
    );
    MiningReport {
        index: block.index,
        hash: block.hash.clone(),
        nonce: block.nonce,
        attempts,
        started_at_ms,
        finished_at_ms: unix_millis(),
        elapsed,
    }
}
