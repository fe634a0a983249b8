//! Settlement guard: each batch hits the ledger at most once per direction.
//!
//! A batch is applied once (on verification) and reversed at most once (on
//! rejection after verification). The guard remembers both in bounded,
//! insertion-ordered sets so memory stays predictable in long-running
//! engines. It is an in-process fast path; the durable record of what was
//! applied is the batch status committed together with the balances.

use std::collections::{HashSet, VecDeque};

use optiroll_types::{BatchId, Result, RollupError};

/// Bounded set with oldest-first eviction.
struct BoundedSet {
    members: HashSet<BatchId>,
    /// Insertion order (front = oldest).
    order: VecDeque<BatchId>,
    max_size: usize,
}

impl BoundedSet {
    fn new(max_size: usize) -> Self {
        Self {
            members: HashSet::with_capacity(max_size),
            order: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Returns `false` if `id` was already present.
    fn insert(&mut self, id: BatchId) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        if self.members.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.members.insert(id);
        self.order.push_back(id);
        true
    }

    fn contains(&self, id: &BatchId) -> bool {
        self.members.contains(id)
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}

/// Remembers which batches have been applied to and reversed on the ledger.
pub struct SettlementGuard {
    applied: BoundedSet,
    reversed: BoundedSet,
}

impl SettlementGuard {
    /// Create a guard remembering up to `max_size` batches per direction.
    ///
    /// # Panics
    /// Panics if `max_size` is zero.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "SettlementGuard max_size must be > 0");
        Self {
            applied: BoundedSet::new(max_size),
            reversed: BoundedSet::new(max_size),
        }
    }

    /// Fail if `batch_id` has already been applied.
    ///
    /// # Errors
    /// Returns [`RollupError::BatchAlreadyApplied`].
    pub fn check_apply(&self, batch_id: BatchId) -> Result<()> {
        if self.applied.contains(&batch_id) {
            return Err(RollupError::BatchAlreadyApplied(batch_id));
        }
        Ok(())
    }

    /// Fail if `batch_id` has already been reversed.
    ///
    /// # Errors
    /// Returns [`RollupError::BatchAlreadyReversed`].
    pub fn check_reverse(&self, batch_id: BatchId) -> Result<()> {
        if self.reversed.contains(&batch_id) {
            return Err(RollupError::BatchAlreadyReversed(batch_id));
        }
        Ok(())
    }

    /// Record a committed application.
    ///
    /// # Errors
    /// Returns [`RollupError::BatchAlreadyApplied`] if already recorded.
    pub fn mark_applied(&mut self, batch_id: BatchId) -> Result<()> {
        if !self.applied.insert(batch_id) {
            return Err(RollupError::BatchAlreadyApplied(batch_id));
        }
        Ok(())
    }

    /// Record a committed reversal.
    ///
    /// # Errors
    /// Returns [`RollupError::BatchAlreadyReversed`] if already recorded.
    pub fn mark_reversed(&mut self, batch_id: BatchId) -> Result<()> {
        if !self.reversed.insert(batch_id) {
            return Err(RollupError::BatchAlreadyReversed(batch_id));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_applied(&self, batch_id: &BatchId) -> bool {
        self.applied.contains(batch_id)
    }

    #[must_use]
    pub fn is_reversed(&self, batch_id: &BatchId) -> bool {
        self.reversed.contains(batch_id)
    }

    /// Number of applied batches currently tracked.
    #[must_use]
    pub fn applied_len(&self) -> usize {
        self.applied.len()
    }
}
