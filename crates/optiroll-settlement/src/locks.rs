//! Per-batch mutual exclusion.
//!
//! Every lifecycle transition holds its batch's lock from the status read
//! to the final write, so concurrent verify/finalize/challenge/reject calls
//! on one batch serialize while different batches proceed in parallel.
//! An entry lives only while some caller holds or waits for it: the last
//! [`BatchGuard`] to drop removes it, whatever the outcome of the call.

use std::collections::HashMap;
use std::sync::Arc;

use optiroll_types::BatchId;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock table keyed by batch.
#[derive(Default)]
pub struct BatchLocks {
    table: Mutex<HashMap<BatchId, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one batch. Dropping it releases the lock and prunes
/// the table entry when no other caller is holding or waiting for it.
pub struct BatchGuard<'a> {
    locks: &'a BatchLocks,
    batch_id: BatchId,
    lock: Arc<AsyncMutex<()>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl BatchLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `batch_id`.
    pub async fn acquire(&self, batch_id: BatchId) -> BatchGuard<'_> {
        let lock = self.table.lock().entry(batch_id).or_default().clone();
        let mut guard = BatchGuard {
            locks: self,
            batch_id,
            lock,
            held: None,
        };
        guard.held = Some(guard.lock.clone().lock_owned().await);
        guard
    }

    /// Number of batches with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

impl BatchGuard<'_> {
    #[must_use]
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.held.take();
        // New handles are only cloned under the table lock, so the count
        // cannot grow while it is held. Two means the table and this guard.
        let mut table = self.locks.table.lock();
        let ours = table
            .get(&self.batch_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock));
        if ours && Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.batch_id);
        }
    }
}
