pub mod pow;
pub mod signal;

pub use pow::{SearchOutcome, search};
pub use signal::MiningSignal;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::blockchain::{Block, Ledger, Retarget};
use crate::error::Result;
use crate::transaction::TransactionPool;

/// A block this miner appended.
#[derive(Debug, Clone)]
pub struct SealedBlock {
    pub height: usize,
    pub block: Block,
    pub attempts: u64,
    pub elapsed: Duration,
    pub retarget: Option<Retarget>,
}

#[derive(Debug, Clone)]
pub enum RoundOutcome {
    Sealed(SealedBlock),
    /// The search was interrupted and its transactions went back to the pool.
    Cancelled { requeued: usize },
}

/// Drains the pool into candidate blocks, seals them by proof-of-work and
/// appends them. The only writer of blocks.
pub struct Miner {
    ledger: Arc<Mutex<Ledger>>,
    pool: Arc<Mutex<TransactionPool>>,
    signal: MiningSignal,
    address: String,
}

impl Miner {
    pub fn new(
        ledger: Arc<Mutex<Ledger>>,
        pool: Arc<Mutex<TransactionPool>>,
        signal: MiningSignal,
        address: String,
    ) -> Self {
        Self {
            ledger,
            pool,
            signal,
            address,
        }
    }

    /// Mine blocks until shutdown. An `Integrity` error from the ledger ends
    /// the loop and is returned to the caller.
    pub fn run(&self) -> Result<()> {
        info!("MINER - started, address={}", self.address);
        while !self.signal.is_shutdown() {
            match self.mine_round()? {
                RoundOutcome::Sealed(sealed) => {
                    info!(
                        "MINER - sealed block #{} hash={} diff={} txs={} attempts={} ({:.3}s)",
                        sealed.height,
                        sealed.block.hash,
                        sealed.block.difficulty,
                        sealed.block.transactions.len(),
                        sealed.attempts,
                        sealed.elapsed.as_secs_f64()
                    );
                    if let Some(r) = sealed.retarget {
                        info!("MINER - difficulty {} -> {}", r.previous, r.next);
                    }
                }
                RoundOutcome::Cancelled { requeued } => {
                    debug!("MINER - search cancelled, requeued {requeued} txs")
                }
            }
        }
        info!("MINER - stopped");
        Ok(())
    }

    /// One iteration: assemble a candidate, search, append, retarget.
    pub fn mine_round(&self) -> Result<RoundOutcome> {
        let started = Instant::now();
        let mut block = self.assemble();

        let seed = u64::from(rand::random::<u32>());
        let outcome = search(&mut block, seed, &self.signal);
        self.signal.set_idle_candidate(false);

        match outcome {
            SearchOutcome::Sealed { attempts } => {
                let mut sealed = self.commit(block)?;
                sealed.attempts = attempts;
                sealed.elapsed = started.elapsed();
                Ok(RoundOutcome::Sealed(sealed))
            }
            SearchOutcome::Cancelled => {
                let requeued = self.requeue(block);
                self.signal.clear();
                Ok(RoundOutcome::Cancelled { requeued })
            }
        }
    }

    /// Candidate on top of the current head, carrying up to
    /// `block_limitation` transactions from the pool head.
    pub fn assemble(&self) -> Block {
        let (previous_hash, difficulty, params) = {
            let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
            (
                ledger.head().hash.clone(),
                ledger.difficulty(),
                *ledger.params(),
            )
        };

        let transactions = {
            let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
            let txs = pool.drain(params.block_limitation);
            self.signal.set_idle_candidate(txs.is_empty());
            debug!(
                "MINER - drained {} txs ({} still pending)",
                txs.len(),
                pool.len()
            );
            txs
        };

        Block::new(
            previous_hash,
            difficulty,
            self.address.clone(),
            params.miner_rewards,
            transactions,
        )
    }

    /// Append a sealed block and retarget under one ledger lock.
    pub fn commit(&self, block: Block) -> Result<SealedBlock> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.append(block.clone())?;
        let height = ledger.len() - 1;
        let retarget = ledger.adjust_difficulty();
        Ok(SealedBlock {
            height,
            block,
            attempts: 0,
            elapsed: Duration::ZERO,
            retarget,
        })
    }

    /// Return an abandoned candidate's transactions to the front of the pool.
    fn requeue(&self, mut block: Block) -> usize {
        let txs = std::mem::take(&mut block.transactions);
        let n = txs.len();
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        pool.requeue_front(txs);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::{Miner, MiningSignal, RoundOutcome};
    use crate::blockchain::{ChainParams, Ledger};
    use crate::error::{IntegrityFault, LedgerError};
    use crate::transaction::{Transaction, TransactionPool};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    type Fixture = (
        Miner,
        Arc<Mutex<Ledger>>,
        Arc<Mutex<TransactionPool>>,
        MiningSignal,
    );

    fn setup(params: ChainParams) -> Fixture {
        let ledger = Arc::new(Mutex::new(Ledger::new(params, "miner")));
        let pool = Arc::new(Mutex::new(TransactionPool::new()));
        let signal = MiningSignal::new();
        let miner = Miner::new(ledger.clone(), pool.clone(), signal.clone(), "miner".into());
        (miner, ledger, pool, signal)
    }

    fn fill(pool: &Mutex<TransactionPool>, n: usize) {
        let mut pool = pool.lock().unwrap();
        for i in 0..n {
            pool.insert(Transaction::with_timestamp("k", format!("m{i}"), 0))
                .unwrap();
        }
    }

    fn sealed(outcome: RoundOutcome) -> super::SealedBlock {
        match outcome {
            RoundOutcome::Sealed(s) => s,
            other => panic!("expected a sealed block, got {other:?}"),
        }
    }

    #[test]
    fn mined_blocks_meet_difficulty_and_link() {
        let (miner, ledger, pool, _) = setup(ChainParams::default());
        fill(&pool, 3);

        let s = sealed(miner.mine_round().unwrap());
        assert_eq!(s.height, 1);
        assert_eq!(s.block.reward, 10);
        assert_eq!(s.block.miner, "miner");

        let ledger = ledger.lock().unwrap();
        let head = ledger.head();
        assert!(head.hash.starts_with(&"0".repeat(head.difficulty as usize)));
        assert_eq!(head.hash, head.compute_hash());
        assert_eq!(head.previous_hash, ledger.export()[0].hash);
        assert!(ledger.verify().valid);
    }

    #[test]
    fn block_limitation_splits_backlog_across_blocks() {
        let (miner, _, pool, _) = setup(ChainParams::default());
        fill(&pool, 7);

        let first = sealed(miner.mine_round().unwrap());
        let msgs: Vec<_> = first
            .block
            .transactions
            .iter()
            .map(|t| t.message.clone())
            .collect();
        assert_eq!(msgs, vec!["m0", "m1", "m2", "m3", "m4"]);
        assert_eq!(pool.lock().unwrap().len(), 2);

        let second = sealed(miner.mine_round().unwrap());
        let msgs: Vec<_> = second
            .block
            .transactions
            .iter()
            .map(|t| t.message.clone())
            .collect();
        assert_eq!(msgs, vec!["m5", "m6"]);
        assert!(pool.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_pool_still_produces_blocks() {
        let (miner, ledger, _, _) = setup(ChainParams::default());
        let s = sealed(miner.mine_round().unwrap());
        assert!(s.block.transactions.is_empty());
        assert_eq!(ledger.lock().unwrap().len(), 2);
    }

    #[test]
    fn cancelled_round_requeues_in_order_at_front() {
        let (miner, ledger, pool, signal) = setup(ChainParams::default());
        fill(&pool, 3);
        signal.cancel();

        match miner.mine_round().unwrap() {
            RoundOutcome::Cancelled { requeued } => assert_eq!(requeued, 3),
            other => panic!("expected cancellation, got {other:?}"),
        }
        assert!(!signal.is_cancelled());
        assert_eq!(ledger.lock().unwrap().len(), 1);

        let order: Vec<_> = pool
            .lock()
            .unwrap()
            .snapshot()
            .into_iter()
            .map(|t| t.message)
            .collect();
        assert_eq!(order, vec!["m0", "m1", "m2"]);

        // next round picks them up unchanged
        let s = sealed(miner.mine_round().unwrap());
        assert_eq!(s.block.transactions.len(), 3);
    }

    #[test]
    fn difficulty_steps_up_each_epoch() {
        let params = ChainParams {
            adjust_difficulty_blocks: 2,
            ..ChainParams::default()
        };
        let (miner, ledger, _, _) = setup(params);

        sealed(miner.mine_round().unwrap()); // len 2
        assert_eq!(ledger.lock().unwrap().difficulty(), 1);
        let s = sealed(miner.mine_round().unwrap()); // len 3: boundary
        assert_eq!(s.retarget.map(|r| r.next), Some(2));
        assert_eq!(ledger.lock().unwrap().difficulty(), 2);

        let s = sealed(miner.mine_round().unwrap());
        assert_eq!(s.block.difficulty, 2);
        assert!(s.block.hash.starts_with("00"));
    }

    #[test]
    fn stale_candidate_is_rejected_as_integrity_error() {
        let (miner, ledger, _, signal) = setup(ChainParams::default());
        let mut candidate = miner.assemble();

        // a second writer moves the head underneath the candidate
        let mut rival = miner.assemble();
        super::search(&mut rival, 0, &signal);
        ledger.lock().unwrap().append(rival).unwrap();

        super::search(&mut candidate, 0, &signal);
        let err = miner.commit(candidate).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Integrity {
                index: 2,
                fault: IntegrityFault::LinkageMismatch
            }
        );
        assert_eq!(ledger.lock().unwrap().len(), 2);
    }

    #[test]
    fn shutdown_interrupts_long_search() {
        let (miner, ledger, pool, signal) = setup(ChainParams::default());
        fill(&pool, 2);
        // impossible target: only the signal can end the search
        ledger.lock().unwrap().set_difficulty_for_test(64);

        let stopper = {
            let signal = signal.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                signal.shutdown();
            })
        };
        miner.run().unwrap();
        stopper.join().unwrap();

        assert_eq!(ledger.lock().unwrap().len(), 1);
        assert_eq!(pool.lock().unwrap().len(), 2);
    }
}
