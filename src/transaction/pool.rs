use std::collections::VecDeque;

use super::model::Transaction;
use crate::error::{LedgerError, Result};

/// Two records with the same sender and message closer together than this
/// are treated as a replay.
pub const DUPLICATE_WINDOW_SECS: i64 = 300;

/// FIFO of authorized transactions waiting for a block.
#[derive(Debug, Default)]
pub struct TransactionPool {
    queue: VecDeque<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Append to the tail unless a pending transaction makes this one a replay.
    pub fn insert(&mut self, tx: Transaction) -> Result<()> {
        if self
            .queue
            .iter()
            .any(|pending| tx.is_replay_of(pending, DUPLICATE_WINDOW_SECS))
        {
            return Err(LedgerError::DuplicateTransaction);
        }
        self.queue.push_back(tx);
        Ok(())
    }

    /// Remove up to `limit` transactions from the head, preserving order.
    pub fn drain(&mut self, limit: usize) -> Vec<Transaction> {
        let take = limit.min(self.queue.len());
        self.queue.drain(..take).collect()
    }

    /// Put transactions back at the head, ahead of anything that arrived
    /// while they were out. `txs` keeps its own order.
    pub fn requeue_front(&mut self, txs: Vec<Transaction>) {
        for tx in txs.into_iter().rev() {
            self.queue.push_front(tx);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Owned copy of the pending queue, head first.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.queue.iter().cloned().collect()
    }
}
