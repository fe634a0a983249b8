//! In-memory [`SettlementStore`].
//!
//! All state sits behind one mutex, so every call (including the multi-key
//! writes) is trivially atomic. Outages and slow backends can be simulated
//! with [`InMemoryStore::set_unavailable`] and [`InMemoryStore::set_latency`].

use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use optiroll_types::{Address, Batch, BatchId, LedgerEntry, Receipt, Result, RollupError};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::store::{BalanceMap, SettlementStore};

#[derive(Default)]
struct Inner {
    /// UUIDv7 keys keep batches in creation order.
    batches: BTreeMap<BatchId, Batch>,
    balances: BalanceMap,
    receipts: HashMap<BatchId, Vec<Receipt>>,
}

/// Process-local store backed by ordered maps.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
    balance_writes: AtomicUsize,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable` (or succeed
    /// again with `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Number of successful balance writes (`save_balances` +
    /// `commit_settlement`) since creation.
    pub fn balance_writes(&self) -> usize {
        self.balance_writes.load(Ordering::SeqCst)
    }

    async fn gate(&self, op: &'static str) -> Result<()> {
        let latency = *self.latency.lock();
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RollupError::StoreUnavailable {
                reason: format!("in-memory store offline during {op}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SettlementStore for InMemoryStore {
    async fn load_batch(&self, id: BatchId) -> Result<Option<Batch>> {
        self.gate("load_batch").await?;
        Ok(self.inner.lock().batches.get(&id).cloned())
    }

    async fn save_batch(&self, batch: &Batch) -> Result<()> {
        self.gate("save_batch").await?;
        self.inner.lock().batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn list_batches(&self) -> Result<Vec<Batch>> {
        self.gate("list_batches").await?;
        Ok(self.inner.lock().batches.values().cloned().collect())
    }

    async fn load_balance(&self, address: &Address) -> Result<Decimal> {
        self.gate("load_balance").await?;
        Ok(self
            .inner
            .lock()
            .balances
            .get(address)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn load_balances(&self) -> Result<Vec<LedgerEntry>> {
        self.gate("load_balances").await?;
        Ok(self
            .inner
            .lock()
            .balances
            .iter()
            .map(|(address, balance)| LedgerEntry {
                address: *address,
                balance: *balance,
            })
            .collect())
    }

    async fn save_balances(&self, balances: &BalanceMap) -> Result<()> {
        self.gate("save_balances").await?;
        let mut inner = self.inner.lock();
        for (address, balance) in balances {
            inner.balances.insert(*address, *balance);
        }
        self.balance_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit_settlement(&self, batch: &Batch, balances: &BalanceMap) -> Result<()> {
        self.gate("commit_settlement").await?;
        let mut inner = self.inner.lock();
        for (address, balance) in balances {
            inner.balances.insert(*address, *balance);
        }
        inner.batches.insert(batch.id, batch.clone());
        self.balance_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn append_receipt(&self, receipt: &Receipt) -> Result<()> {
        self.gate("append_receipt").await?;
        self.inner
            .lock()
            .receipts
            .entry(receipt.batch_id)
            .or_default()
            .push(receipt.clone());
        Ok(())
    }

    async fn receipts(&self, id: BatchId) -> Result<Vec<Receipt>> {
        self.gate("receipts").await?;
        Ok(self
            .inner
            .lock()
            .receipts
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use optiroll_types::{BatchStatus, ReceiptType, Transaction};

    use super::*;

    fn make_batch() -> Batch {
        Batch {
            id: BatchId::new(),
            transactions_root: [1u8; 32],
            transactions: vec![Transaction::dummy(Decimal::ONE)],
            created_at: Utc::now(),
            status: BatchStatus::Pending,
            rejection_reason: None,
            challenge_deadline: None,
            verified_at: None,
            finalized_at: None,
        }
    }

    #[tokio::test]
    async fn batch_roundtrip() {
        let store = InMemoryStore::new();
        let batch = make_batch();
        store.save_batch(&batch).await.unwrap();
        assert_eq!(store.load_batch(batch.id).await.unwrap(), Some(batch));
        assert_eq!(store.load_batch(BatchId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_batches_in_creation_order() {
        let store = InMemoryStore::new();
        let first = make_batch();
        let second = make_batch();
        store.save_batch(&second).await.unwrap();
        store.save_batch(&first).await.unwrap();
        let ids: Vec<BatchId> = store
            .list_batches()
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn unknown_balance_is_zero() {
        let store = InMemoryStore::new();
        let balance = store.load_balance(&Address::random()).await.unwrap();
        assert_eq!(balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn commit_settlement_writes_both() {
        let store = InMemoryStore::new();
        let mut batch = make_batch();
        store.save_batch(&batch).await.unwrap();

        batch.status = BatchStatus::Verified;
        let a = Address::random();
        let balances = BalanceMap::from([(a, Decimal::new(42, 0))]);
        store.commit_settlement(&batch, &balances).await.unwrap();

        assert_eq!(store.load_balance(&a).await.unwrap(), Decimal::new(42, 0));
        let stored = store.load_batch(batch.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BatchStatus::Verified);
        assert_eq!(store.balance_writes(), 1);
    }

    #[tokio::test]
    async fn outage_fails_without_writing() {
        let store = InMemoryStore::new();
        let a = Address::random();
        store.set_unavailable(true);
        let err = store
            .save_balances(&BalanceMap::from([(a, Decimal::ONE)]))
            .await
            .unwrap_err();
        assert!(matches!(err, RollupError::StoreUnavailable { .. }));

        store.set_unavailable(false);
        assert_eq!(store.load_balance(&a).await.unwrap(), Decimal::ZERO);
        assert_eq!(store.balance_writes(), 0);
    }

    #[tokio::test]
    async fn receipts_append_in_order() {
        let store = InMemoryStore::new();
        let batch = make_batch();
        for rt in [ReceiptType::BatchSubmitted, ReceiptType::BatchVerified] {
            store
                .append_receipt(&Receipt::issue(rt, &batch, None, Utc::now()))
                .await
                .unwrap();
        }
        let kinds: Vec<ReceiptType> = store
            .receipts(batch.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.receipt_type)
            .collect();
        assert_eq!(
            kinds,
            vec![ReceiptType::BatchSubmitted, ReceiptType::BatchVerified]
        );
    }
}
