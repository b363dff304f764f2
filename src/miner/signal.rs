use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Flags {
    cancelled: AtomicBool,
    shutdown: AtomicBool,
    idle_candidate: AtomicBool,
}

/// Cooperative control channel between the ingestion side and the miner.
///
/// The proof-of-work search samples `should_stop` at every nonce. Cancelling
/// abandons the current candidate only; shutdown stops the miner loop.
#[derive(Debug, Clone, Default)]
pub struct MiningSignal(Arc<Flags>);

impl MiningSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the in-flight search. Its transactions go back to the pool.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Reset the cancel flag; returns whether it was set.
    pub fn clear(&self) -> bool {
        self.0.cancelled.swap(false, Ordering::SeqCst)
    }

    /// Stop the miner loop after the current search.
    pub fn shutdown(&self) {
        self.0.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.shutdown.load(Ordering::SeqCst)
    }

    /// Checked once per nonce.
    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.is_shutdown()
    }

    /// Called by the miner (under the pool lock) once the candidate is assembled.
    pub(crate) fn set_idle_candidate(&self, idle: bool) {
        self.0.idle_candidate.store(idle, Ordering::SeqCst);
    }

    /// A transaction was just queued. Interrupt the search only if it is
    /// sealing an empty block, so a steady stream cannot starve mining.
    /// Returns whether a cancel was issued.
    pub fn notify_pending(&self) -> bool {
        if self.0.idle_candidate.swap(false, Ordering::SeqCst) {
            self.cancel();
            true
        } else {
            false
        }
    }
}
