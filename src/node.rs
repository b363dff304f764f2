use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::blockchain::{Block, ChainParams, Ledger, Retarget, Verification};
use crate::error::{LedgerError, Result};
use crate::miner::{Miner, MiningSignal};
use crate::transaction::{AuthorizationRegistry, Transaction, TransactionPool};
use crate::wallet::SignatureVerifier;

/// Point-in-time figures for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStats {
    pub height: usize,
    pub difficulty: u32,
    pub adjust_difficulty_blocks: usize,
    pub block_limitation: usize,
    pub miner_rewards: u64,
    pub target_block_time_secs: i64,
    pub last_interval_secs: Option<i64>,
    pub avg_interval_secs: Option<f64>,
    pub last_retarget: Option<Retarget>,
    pub pool_size: usize,
    pub authorized_senders: usize,
}

/// The single owned state of a running ledger node: chain, pool, registry
/// and the signature gate, each behind its own lock.
pub struct Node {
    ledger: Arc<Mutex<Ledger>>,
    pool: Arc<Mutex<TransactionPool>>,
    registry: RwLock<AuthorizationRegistry>,
    verifier: Box<dyn SignatureVerifier>,
    signal: MiningSignal,
    fault: Mutex<Option<LedgerError>>,
}

impl Node {
    /// Build the node around a fresh genesis block credited to `genesis_miner`.
    pub fn new(
        params: ChainParams,
        genesis_miner: &str,
        verifier: Box<dyn SignatureVerifier>,
    ) -> Self {
        Self::with_ledger(Ledger::new(params, genesis_miner), verifier)
    }

    pub fn with_ledger(ledger: Ledger, verifier: Box<dyn SignatureVerifier>) -> Self {
        info!(
            "Created genesis block {} (difficulty {})",
            ledger.head().hash,
            ledger.difficulty()
        );
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            pool: Arc::new(Mutex::new(TransactionPool::new())),
            registry: RwLock::new(AuthorizationRegistry::new()),
            verifier,
            signal: MiningSignal::new(),
            fault: Mutex::new(None),
        }
    }

    /* ---------- commands ---------- */

    /// Add a sender to the authorization set. Never fails.
    pub fn register_sender(&self, public_key: &str) -> bool {
        let added = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .authorize(public_key);
        if added {
            info!("Registered sender {}", short(public_key));
        } else {
            debug!("Sender {} already registered", short(public_key));
        }
        added
    }

    /// Gate and enqueue a signed transaction: authorization, signature,
    /// replay window, then FIFO append. The timestamp is not signed, so the
    /// node stamps arrival time over whatever the caller supplied.
    pub fn submit_transaction(&self, mut tx: Transaction, signature: &str) -> Result<()> {
        tx.timestamp = Utc::now().timestamp();
        let authorized = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authorized(&tx.sender);
        if !authorized {
            warn!("Rejected tx from unregistered sender {}", short(&tx.sender));
            return Err(LedgerError::Authorization);
        }

        if let Err(e) = self
            .verifier
            .verify(tx.canonical_string().as_bytes(), signature, &tx.sender)
        {
            warn!("Rejected tx from {}: {e}", short(&tx.sender));
            return Err(e);
        }

        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = pool.insert(tx) {
            warn!("Rejected tx: {e}");
            return Err(e);
        }
        debug!("Accepted tx into pool (size {})", pool.len());
        // still under the pool lock, so the miner cannot be mid-drain
        if self.signal.notify_pending() {
            debug!("Interrupting empty-block search for new work");
        }
        Ok(())
    }

    /// Interrupt the current proof-of-work search. Its transactions are
    /// requeued and mining restarts on a fresh candidate.
    pub fn interrupt_mining(&self) {
        self.signal.cancel();
    }

    /* ---------- queries ---------- */

    /// Owned copy of the full chain, genesis first.
    pub fn get_chain(&self) -> Vec<Block> {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .export()
            .to_vec()
    }

    /// Chain and current difficulty read under one ledger lock.
    pub fn chain_snapshot(&self) -> (Vec<Block>, u32) {
        let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        (ledger.export().to_vec(), ledger.difficulty())
    }

    pub fn verify_chain(&self) -> (Verification, usize) {
        let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        (ledger.verify(), ledger.len())
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    pub fn stats(&self) -> NodeStats {
        let mut stats = {
            let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
            let chain = ledger.export();
            let params = ledger.params();
            let last_interval_secs = match chain {
                [.., older, newer] => Some((newer.timestamp - older.timestamp).max(0)),
                _ => None,
            };
            NodeStats {
                height: chain.len(),
                difficulty: ledger.difficulty(),
                adjust_difficulty_blocks: params.adjust_difficulty_blocks,
                block_limitation: params.block_limitation,
                miner_rewards: params.miner_rewards,
                target_block_time_secs: params.block_time_secs,
                last_interval_secs,
                avg_interval_secs: ledger.controller().average_block_secs(chain),
                last_retarget: ledger.last_retarget(),
                pool_size: 0,
                authorized_senders: 0,
            }
        };
        stats.pool_size = self.pool.lock().unwrap_or_else(PoisonError::into_inner).len();
        stats.authorized_senders = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        stats
    }

    /// Set when the miner halted on an integrity violation.
    pub fn fault(&self) -> Option<LedgerError> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /* ---------- mining ---------- */

    /// A miner wired to this node's ledger, pool and signal.
    pub fn miner(&self, address: String) -> Miner {
        Miner::new(
            self.ledger.clone(),
            self.pool.clone(),
            self.signal.clone(),
            address,
        )
    }

    /// Run the miner on a dedicated thread. An integrity failure halts it,
    /// is logged, and is recorded for `fault()`.
    pub fn spawn_miner(
        self: &Arc<Self>,
        address: String,
    ) -> std::io::Result<thread::JoinHandle<Result<()>>> {
        let node = Arc::clone(self);
        thread::Builder::new()
            .name("miner".into())
            .spawn(move || {
                let result = node.miner(address).run();
                if let Err(e) = &result {
                    error!("MINER - halted: {e}");
                    let mut fault = node.fault.lock().unwrap_or_else(PoisonError::into_inner);
                    *fault = Some(e.clone());
                }
                result
            })
    }

    /// Ask the miner loop to stop after (or instead of) its current search.
    pub fn shutdown(&self) {
        self.signal.shutdown();
    }

    /// Spawn the miner, then keep slipping rival blocks under it until one of
    /// its candidates goes stale. Returns whatever the miner thread returned.
    #[cfg(test)]
    pub(crate) fn run_miner_against_rival_writer(self: &Arc<Self>) -> Result<()> {
        use crate::miner::search;
        use std::time::{Duration, Instant};

        let handle = self.spawn_miner("miner".into()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(20);
        while !handle.is_finished() && Instant::now() < deadline {
            // holding the pool parks the miner in assemble() after its head read
            let pool = self.pool.lock().unwrap();
            thread::sleep(Duration::from_millis(20));
            {
                let mut ledger = self.ledger.lock().unwrap();
                let mut rival =
                    Block::new(ledger.head().hash.clone(), 1, "rival".into(), 0, Vec::new());
                search(&mut rival, 0, &MiningSignal::new());
                ledger.append(rival)?;
            }
            drop(pool);
            thread::sleep(Duration::from_millis(5));
        }
        self.shutdown();
        handle.join().unwrap()
    }
}

/// Keys are long hex strings; log a recognisable prefix.
fn short(key: &str) -> &str {
    key.get(..16).unwrap_or(key)
}
