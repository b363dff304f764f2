use log::info;
use serde::Serialize;

use super::{Block, MAX_DIFFICULTY};

/// Outcome of an epoch-boundary retarget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Retarget {
    pub previous: u32,
    pub next: u32,
    /// Average seconds per block over the epoch that just closed.
    pub average_block_secs: f64,
}

/// Recomputes the proof-of-work target once per epoch.
///
/// The policy is monotonic: every epoch boundary raises the difficulty by one
/// until it reaches `MAX_DIFFICULTY`. The measured average is reported but
/// does not pick the direction.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyController {
    epoch_len: usize,
}

impl DifficultyController {
    pub fn new(epoch_len: usize) -> Self {
        Self {
            epoch_len: epoch_len.max(1),
        }
    }

    /// Whether a chain of `len` blocks sits on an epoch boundary past the
    /// first full epoch.
    pub fn is_boundary(&self, len: usize) -> bool {
        len % self.epoch_len == 1 && len > self.epoch_len
    }

    /// Average block time over the last `epoch_len` intervals, if the chain
    /// is long enough to have one.
    pub fn average_block_secs(&self, chain: &[Block]) -> Option<f64> {
        let len = chain.len();
        if len <= self.epoch_len {
            return None;
        }
        let start = chain[len - self.epoch_len - 1].timestamp;
        let finish = chain[len - 1].timestamp;
        Some((finish - start) as f64 / self.epoch_len as f64)
    }

    /// Difficulty for the next block. `None` off the epoch boundary, in which
    /// case the current value stands.
    pub fn next_difficulty(&self, chain: &[Block], current: u32) -> Option<Retarget> {
        if !self.is_boundary(chain.len()) {
            return None;
        }
        let average_block_secs = self.average_block_secs(chain)?;
        let next = if current >= MAX_DIFFICULTY {
            current
        } else {
            current + 1
        };
        info!(
            "Average block time: {:.2}s over {} blocks (difficulty {} -> {})",
            average_block_secs, self.epoch_len, current, next
        );
        Some(Retarget {
            previous: current,
            next,
            average_block_secs,
        })
    }
}
