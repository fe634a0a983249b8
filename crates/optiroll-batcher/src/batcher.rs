//! Batcher: turns transactions into an immutable, committed `Batch`.
//!
//! The batcher computes the commitment root, assigns a fresh `BatchId`,
//! and persists the pending batch before returning it, so a crash after
//! `create_batch` returns cannot lose the batch. It does not check sender
//! balances; those can change before verification, which is where the
//! ledger checks them.

use std::sync::Arc;

use optiroll_commitment::CommitmentTree;
use optiroll_store::SettlementStore;
use optiroll_types::{
    Batch, BatchId, BatchStatus, Clock, Result, RollupError, SettlementAnchor, Transaction,
};

use crate::pending_pool::PendingPool;

/// Commits transaction sets into pending batches.
pub struct Batcher {
    store: Arc<dyn SettlementStore>,
    clock: Arc<dyn Clock>,
    max_batch_size: usize,
}

impl Batcher {
    #[must_use]
    pub fn new(store: Arc<dyn SettlementStore>, clock: Arc<dyn Clock>, max_batch_size: usize) -> Self {
        Self {
            store,
            clock,
            max_batch_size,
        }
    }

    /// Commit `transactions` (in the given order) into a new pending batch.
    ///
    /// Identical transactions are accepted here. Once verified, such a
    /// batch can be rejected by any challenger as a double spend.
    ///
    /// # Errors
    /// - `EmptyBatch` if `transactions` is empty
    /// - `BatchTooLarge` if it exceeds the configured maximum
    /// - `InvalidTransaction` if any amount is malformed
    /// - `StoreUnavailable` if the batch could not be persisted
    pub async fn create_batch(&self, transactions: Vec<Transaction>) -> Result<Batch> {
        if transactions.is_empty() {
            return Err(RollupError::EmptyBatch);
        }
        if transactions.len() > self.max_batch_size {
            return Err(RollupError::BatchTooLarge {
                size: transactions.len(),
                max: self.max_batch_size,
            });
        }
        for tx in &transactions {
            tx.validate()?;
        }

        let tree = CommitmentTree::build(&transactions)?;
        let batch = Batch {
            id: BatchId::new(),
            transactions_root: tree.root(),
            transactions,
            created_at: self.clock.now(),
            status: BatchStatus::Pending,
            rejection_reason: None,
            challenge_deadline: None,
            verified_at: None,
            finalized_at: None,
        };

        self.store.save_batch(&batch).await?;

        tracing::info!(
            batch = %batch.id,
            transactions = batch.transaction_count(),
            root = batch.root_hex(),
            "Batch created"
        );
        Ok(batch)
    }

    /// Seal `pool` and commit everything in it as one batch.
    ///
    /// If the commit fails, the drained transactions go back into the pool
    /// (reopened) so nothing submitted is lost.
    pub async fn commit_pool(&self, pool: &mut PendingPool) -> Result<Batch> {
        if !pool.is_sealed() {
            pool.seal()?;
        }
        let transactions = pool.drain()?;
        match self.create_batch(transactions.clone()).await {
            Ok(batch) => {
                pool.reset();
                Ok(batch)
            }
            Err(err) => {
                tracing::warn!(error = %err, pending = transactions.len(), "Pool commit failed");
                pool.restore(transactions);
                Err(err)
            }
        }
    }

    /// Record for the primary settlement layer.
    #[must_use]
    pub fn anchor(batch: &Batch) -> SettlementAnchor {
        batch.anchor()
    }

    /// Recompute the root from the batch's transaction list and compare
    /// with the recorded root.
    #[must_use]
    pub fn verify_root(batch: &Batch) -> bool {
        CommitmentTree::build(&batch.transactions)
            .is_ok_and(|tree| tree.root() == batch.transactions_root)
    }
}

#[cfg(test)]
mod tests {
    use optiroll_store::InMemoryStore;
    use optiroll_types::{ManualClock, SystemClock};
    use rust_decimal::Decimal;

    use super::*;

    fn make_batcher(store: Arc<InMemoryStore>, max: usize) -> Batcher {
        Batcher::new(store, Arc::new(SystemClock), max)
    }

    fn make_txs(n: u64) -> Vec<Transaction> {
        (1..=n).map(|i| Transaction::dummy(Decimal::from(i))).collect()
    }

    #[tokio::test]
    async fn empty_batch_rejected() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 10);
        let err = batcher.create_batch(vec![]).await.unwrap_err();
        assert!(matches!(err, RollupError::EmptyBatch));
    }

    #[tokio::test]
    async fn oversized_batch_rejected() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 2);
        let err = batcher.create_batch(make_txs(3)).await.unwrap_err();
        assert!(matches!(err, RollupError::BatchTooLarge { size: 3, max: 2 }));
    }

    #[tokio::test]
    async fn create_batch_persists_pending() {
        let store = Arc::new(InMemoryStore::new());
        let batcher = make_batcher(store.clone(), 10);
        let txs = make_txs(3);
        let batch = batcher.create_batch(txs.clone()).await.unwrap();

        assert_eq!(batch.status, BatchStatus::Pending);
        assert_eq!(batch.transactions, txs);
        assert!(batch.challenge_deadline.is_none());
        assert_eq!(
            batch.transactions_root,
            CommitmentTree::build(&txs).unwrap().root()
        );
        assert_eq!(store.load_batch(batch.id).await.unwrap(), Some(batch));
    }

    #[tokio::test]
    async fn created_at_comes_from_clock() {
        let clock = Arc::new(ManualClock::default());
        let batcher = Batcher::new(Arc::new(InMemoryStore::new()), clock.clone(), 10);
        let batch = batcher.create_batch(make_txs(1)).await.unwrap();
        assert_eq!(batch.created_at, clock.now());
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 10);
        let a = batcher.create_batch(make_txs(1)).await.unwrap();
        let b = batcher.create_batch(make_txs(1)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn store_outage_surfaces() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable(true);
        let batcher = make_batcher(store, 10);
        let err = batcher.create_batch(make_txs(2)).await.unwrap_err();
        assert!(matches!(err, RollupError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn commit_pool_drains_and_resets() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 10);
        let mut pool = PendingPool::new();
        for tx in make_txs(4) {
            pool.push(tx).unwrap();
        }
        let batch = batcher.commit_pool(&mut pool).await.unwrap();
        assert_eq!(batch.transaction_count(), 4);
        assert!(pool.is_empty());
        assert!(!pool.is_sealed());
    }

    #[tokio::test]
    async fn failed_commit_restores_pool() {
        let store = Arc::new(InMemoryStore::new());
        let batcher = make_batcher(store.clone(), 10);
        let mut pool = PendingPool::new();
        let txs = make_txs(2);
        for tx in &txs {
            pool.push(tx.clone()).unwrap();
        }
        store.set_unavailable(true);
        assert!(batcher.commit_pool(&mut pool).await.is_err());
        assert_eq!(pool.transactions(), txs.as_slice());
        assert!(!pool.is_sealed());
    }

    #[tokio::test]
    async fn commit_empty_pool_fails() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 10);
        let mut pool = PendingPool::new();
        let err = batcher.commit_pool(&mut pool).await.unwrap_err();
        assert!(matches!(err, RollupError::EmptyBatch));
        assert!(!pool.is_sealed());
    }

    #[tokio::test]
    async fn verify_root_detects_tampering() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 10);
        let mut batch = batcher.create_batch(make_txs(3)).await.unwrap();
        assert!(Batcher::verify_root(&batch));
        batch.transactions[1].amount += Decimal::ONE;
        assert!(!Batcher::verify_root(&batch));
    }

    #[tokio::test]
    async fn anchor_matches_batch() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 10);
        let batch = batcher.create_batch(make_txs(2)).await.unwrap();
        let anchor = Batcher::anchor(&batch);
        assert_eq!(anchor.transactions_root, batch.transactions_root);
        assert_eq!(anchor.transaction_count, 2);
    }

    #[tokio::test]
    async fn identical_transactions_accepted() {
        let batcher = make_batcher(Arc::new(InMemoryStore::new()), 10);
        let tx = Transaction::dummy(Decimal::TEN);
        let batch = batcher.create_batch(vec![tx.clone(), tx]).await.unwrap();
        assert_eq!(batch.transaction_count(), 2);
        assert_eq!(batch.status, BatchStatus::Pending);
    }
}
