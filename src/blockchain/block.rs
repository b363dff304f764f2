use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::GENESIS_PREVIOUS_HASH;
use crate::transaction::Transaction;

/// A block of confirmed records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub previous_hash: String,
    pub hash: String, // Cached hash of the block
    pub difficulty: u32,
    pub nonce: u64,     // Proof-of-Work nonce
    pub timestamp: i64, // Unix timestamp (UTC), fixed at construction
    pub transactions: Vec<Transaction>,
    pub miner: String,
    pub reward: u64,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis(miner: impl Into<String>, reward: u64) -> Self {
        Self::genesis_at(Utc::now().timestamp(), miner, reward)
    }

    pub fn genesis_at(timestamp: i64, miner: impl Into<String>, reward: u64) -> Self {
        let mut block = Self {
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash: String::new(),
            difficulty: 1,
            nonce: 0,
            timestamp,
            transactions: Vec::new(),
            miner: miner.into(),
            reward,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Create a candidate block (not mined yet). The hash is left empty until
    /// a nonce is found.
    pub fn new(
        previous_hash: String,
        difficulty: u32,
        miner: String,
        reward: u64,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            previous_hash,
            hash: String::new(),
            difficulty,
            nonce: 0,
            timestamp: Utc::now().timestamp(),
            transactions,
            miner,
            reward,
        }
    }

    /// Everything in the preimage except the nonce:
    /// `previous_hash ‖ timestamp ‖ tx_1 ‖ … ‖ tx_n`, where each `tx_i` is the
    /// canonical `{sender, message}` string.
    pub fn hash_prefix(&self) -> String {
        let mut prefix = format!("{}{}", self.previous_hash, self.timestamp);
        for tx in &self.transactions {
            prefix.push_str(&tx.canonical_string());
        }
        prefix
    }

    /// Hex SHA-256 of `prefix ‖ nonce`.
    pub fn hash_with_prefix(prefix: &str, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prefix.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Recompute the hash from the block's fields and its current nonce.
    pub fn compute_hash(&self) -> String {
        Self::hash_with_prefix(&self.hash_prefix(), self.nonce)
    }

    #[cfg(test)]
    /// Validate that the block's cached `hash` matches its content and
    /// satisfies its own difficulty. (Does NOT validate chain linkage.)
    pub fn is_valid(&self) -> bool {
        self.hash == self.compute_hash() && meets_difficulty(&self.hash, self.difficulty)
    }
}

/// At least `difficulty` leading `'0'` hex characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let needed = difficulty as usize;
    hash.len() >= needed && hash.bytes().take(needed).all(|c| c == b'0')
}
