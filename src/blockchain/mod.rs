pub mod block;
pub mod difficulty;
pub mod model;

pub use block::{Block, meets_difficulty};
pub use difficulty::Retarget;
pub use model::{Ledger, Verification, VerifyFailure};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "GENESIS";

/// Difficulty ceiling (number of leading zeros).
pub const MAX_DIFFICULTY: u32 = 6;

/// Blocks per difficulty epoch.
pub const DEFAULT_ADJUST_DIFFICULTY_BLOCKS: usize = 10;

/// Max transactions drained into one block.
pub const DEFAULT_BLOCK_LIMITATION: usize = 5;

/// Fixed reward credited to the miner of each block.
pub const DEFAULT_MINER_REWARDS: u64 = 10;

/// Nominal seconds per block (reported, not enforced).
pub const DEFAULT_BLOCK_TIME_SECS: i64 = 3;

/// Constants that shape the chain for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    pub adjust_difficulty_blocks: usize,
    pub block_limitation: usize,
    pub miner_rewards: u64,
    pub block_time_secs: i64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            adjust_difficulty_blocks: DEFAULT_ADJUST_DIFFICULTY_BLOCKS,
            block_limitation: DEFAULT_BLOCK_LIMITATION,
            miner_rewards: DEFAULT_MINER_REWARDS,
            block_time_secs: DEFAULT_BLOCK_TIME_SECS,
        }
    }
}
