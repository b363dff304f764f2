use super::MiningSignal;
use crate::blockchain::{Block, meets_difficulty};

/// How a proof-of-work search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// `block.nonce` and `block.hash` now hold a qualifying solution.
    Sealed { attempts: u64 },
    /// The signal fired; the block is untouched.
    Cancelled,
}

/// Increment the nonce from `seed` until the hash carries `block.difficulty`
/// leading zeros. The signal is sampled before every attempt.
pub fn search(block: &mut Block, seed: u64, signal: &MiningSignal) -> SearchOutcome {
    let prefix = block.hash_prefix();
    let mut nonce = seed;
    let mut attempts: u64 = 0;
    loop {
        if signal.should_stop() {
            return SearchOutcome::Cancelled;
        }
        attempts += 1;
        let hash = Block::hash_with_prefix(&prefix, nonce);
        if meets_difficulty(&hash, block.difficulty) {
            block.nonce = nonce;
            block.hash = hash;
            return SearchOutcome::Sealed { attempts };
        }
        nonce = nonce.wrapping_add(1);
    }
}
