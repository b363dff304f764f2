use serde::Serialize;

use super::block::meets_difficulty;
use super::difficulty::{DifficultyController, Retarget};
use super::{Block, ChainParams};
use crate::error::{IntegrityFault, LedgerError, Result};

/// First block that failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifyFailure {
    pub index: usize,
    pub fault: IntegrityFault,
}

/// Result of walking the chain from genesis to head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub valid: bool,
    pub first_failure: Option<VerifyFailure>,
}

/// In-memory, append-only, hash-linked chain of blocks.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: u32,
    params: ChainParams,
    controller: DifficultyController,
    last_retarget: Option<Retarget>,
}

impl Ledger {
    /// Initialize a new ledger with a genesis block credited to `miner`.
    pub fn new(params: ChainParams, miner: impl Into<String>) -> Self {
        Self::with_genesis(params, Block::genesis(miner, params.miner_rewards))
    }

    pub fn with_genesis(params: ChainParams, genesis: Block) -> Self {
        Self {
            difficulty: genesis.difficulty,
            chain: vec![genesis],
            params,
            controller: DifficultyController::new(params.adjust_difficulty_blocks),
            last_retarget: None,
        }
    }

    /// Return the last block in the chain.
    pub fn head(&self) -> &Block {
        // The genesis block is pushed on construction and blocks are never removed.
        &self.chain[self.chain.len() - 1]
    }

    /// Append a mined block. Any failure here means the producer computed the
    /// block wrongly; callers treat it as fatal.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let index = self.chain.len();
        let fault = if block.previous_hash != self.head().hash {
            Some(IntegrityFault::LinkageMismatch)
        } else if block.hash != block.compute_hash() {
            Some(IntegrityFault::HashMismatch)
        } else if !meets_difficulty(&block.hash, block.difficulty) {
            Some(IntegrityFault::InsufficientWork)
        } else {
            None
        };

        match fault {
            Some(fault) => Err(LedgerError::Integrity { index, fault }),
            None => {
                self.chain.push(block);
                Ok(())
            }
        }
    }

    /// Recompute every hash and check every link, genesis first.
    pub fn verify(&self) -> Verification {
        let failure = self
            .chain
            .iter()
            .enumerate()
            .find_map(|(index, block)| {
                if block.compute_hash() != block.hash {
                    Some(VerifyFailure {
                        index,
                        fault: IntegrityFault::HashMismatch,
                    })
                } else if index > 0 && block.previous_hash != self.chain[index - 1].hash {
                    Some(VerifyFailure {
                        index,
                        fault: IntegrityFault::LinkageMismatch,
                    })
                } else {
                    None
                }
            });

        Verification {
            valid: failure.is_none(),
            first_failure: failure,
        }
    }

    /// Apply the difficulty controller to the current chain. This is the only
    /// way the difficulty changes.
    pub fn adjust_difficulty(&mut self) -> Option<Retarget> {
        let retarget = self.controller.next_difficulty(&self.chain, self.difficulty)?;
        self.difficulty = retarget.next;
        self.last_retarget = Some(retarget);
        Some(retarget)
    }

    /// Read-only view of every block, genesis first.
    pub fn export(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn controller(&self) -> &DifficultyController {
        &self.controller
    }

    pub fn last_retarget(&self) -> Option<Retarget> {
        self.last_retarget
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.chain
    }

    #[cfg(test)]
    pub(crate) fn set_difficulty_for_test(&mut self, difficulty: u32) {
        self.difficulty = difficulty;
    }
}

#[cfg(test)]
mod tests {
    use super::Ledger;
    use crate::blockchain::{Block, ChainParams};
    use crate::error::{IntegrityFault, LedgerError};
    use crate::transaction::Transaction;

    /// Brute-force a nonce the simple way; tests keep difficulty low.
    fn seal(mut block: Block) -> Block {
        let prefix = block.hash_prefix();
        loop {
            let hash = Block::hash_with_prefix(&prefix, block.nonce);
            if super::meets_difficulty(&hash, block.difficulty) {
                block.hash = hash;
                return block;
            }
            block.nonce += 1;
        }
    }

    fn next_block(ledger: &Ledger, messages: &[&str]) -> Block {
        let txs = messages
            .iter()
            .map(|m| Transaction::with_timestamp("k", *m, 0))
            .collect();
        seal(Block::new(
            ledger.head().hash.clone(),
            ledger.difficulty(),
            "miner".into(),
            10,
            txs,
        ))
    }

    fn ledger_with_blocks(n: usize) -> Ledger {
        let mut ledger = Ledger::new(ChainParams::default(), "miner");
        for i in 0..n {
            let block = next_block(&ledger, &[&format!("m{i}"), "x"]);
            ledger.append(block).unwrap();
        }
        ledger
    }

    #[test]
    fn new_ledger_has_only_genesis() {
        let ledger = Ledger::new(ChainParams::default(), "miner");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.difficulty(), 1);
        assert_eq!(ledger.head().previous_hash, "GENESIS");
        assert!(ledger.verify().valid);
    }

    #[test]
    fn appended_chain_verifies() {
        let ledger = ledger_with_blocks(4);
        assert_eq!(ledger.len(), 5);
        let v = ledger.verify();
        assert!(v.valid);
        assert!(v.first_failure.is_none());
    }

    #[test]
    fn tampered_message_fails_at_its_index() {
        let mut ledger = ledger_with_blocks(4);
        ledger.blocks_mut()[2].transactions[0].message = "forged".into();

        let v = ledger.verify();
        assert!(!v.valid);
        let failure = v.first_failure.unwrap();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.fault, IntegrityFault::HashMismatch);
    }

    #[test]
    fn rehashed_tamper_breaks_linkage_of_next_block() {
        let mut ledger = ledger_with_blocks(3);
        {
            let blocks = ledger.blocks_mut();
            blocks[1].transactions[0].message = "forged".into();
            blocks[1].hash = blocks[1].compute_hash();
        }
        let failure = ledger.verify().first_failure.unwrap();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.fault, IntegrityFault::LinkageMismatch);
    }

    #[test]
    fn append_rejects_wrong_parent() {
        let mut ledger = ledger_with_blocks(1);
        let orphan = seal(Block::new(
            "not-the-head".into(),
            1,
            "miner".into(),
            10,
            vec![],
        ));
        let err = ledger.append(orphan).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Integrity {
                index: 2,
                fault: IntegrityFault::LinkageMismatch
            }
        );
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn append_rejects_stale_hash_and_missing_work() {
        let mut ledger = ledger_with_blocks(0);

        let mut stale = next_block(&ledger, &["a"]);
        stale.nonce += 1;
        assert!(matches!(
            ledger.append(stale),
            Err(LedgerError::Integrity {
                fault: IntegrityFault::HashMismatch,
                ..
            })
        ));

        // Find a nonce whose hash does NOT start with '0'
        let mut lazy = Block::new(ledger.head().hash.clone(), 1, "miner".into(), 10, vec![]);
        loop {
            lazy.hash = lazy.compute_hash();
            if !lazy.hash.starts_with('0') {
                break;
            }
            lazy.nonce += 1;
        }
        assert!(matches!(
            ledger.append(lazy),
            Err(LedgerError::Integrity {
                fault: IntegrityFault::InsufficientWork,
                ..
            })
        ));
    }

    #[test]
    fn adjust_difficulty_fires_on_epoch_boundary_only() {
        let params = ChainParams {
            adjust_difficulty_blocks: 2,
            ..ChainParams::default()
        };
        let mut ledger = Ledger::new(params, "miner");

        let b = next_block(&ledger, &["a"]);
        ledger.append(b).unwrap();
        assert!(ledger.adjust_difficulty().is_none()); // len 2
        let b = next_block(&ledger, &["b"]);
        ledger.append(b).unwrap();
        let r = ledger.adjust_difficulty().unwrap(); // len 3
        assert_eq!((r.previous, r.next), (1, 2));
        assert_eq!(ledger.difficulty(), 2);
        assert_eq!(ledger.last_retarget(), Some(r));
    }
}
