//! Timeout wrapper for any [`SettlementStore`].
//!
//! The engine never blocks indefinitely on storage: each call is raced
//! against `timeout`, and expiry becomes `StoreUnavailable`. Nothing is
//! retried here; retry policy belongs to the caller.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use optiroll_types::{Address, Batch, BatchId, LedgerEntry, Receipt, Result, RollupError};
use rust_decimal::Decimal;

use crate::store::{BalanceMap, SettlementStore};

/// A store whose every call completes or fails within `timeout`.
pub struct TimedStore {
    inner: Arc<dyn SettlementStore>,
    timeout: Duration,
}

impl TimedStore {
    #[must_use]
    pub fn new(inner: Arc<dyn SettlementStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::error!(op, error = %err, "Store call failed");
                Err(err)
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::error!(op, timeout_ms, "Store call timed out");
                Err(RollupError::StoreUnavailable {
                    reason: format!("{op} timed out after {timeout_ms}ms"),
                })
            }
        }
    }
}

#[async_trait]
impl SettlementStore for TimedStore {
    async fn load_batch(&self, id: BatchId) -> Result<Option<Batch>> {
        self.bounded("load_batch", self.inner.load_batch(id)).await
    }

    async fn save_batch(&self, batch: &Batch) -> Result<()> {
        self.bounded("save_batch", self.inner.save_batch(batch)).await
    }

    async fn list_batches(&self) -> Result<Vec<Batch>> {
        self.bounded("list_batches", self.inner.list_batches()).await
    }

    async fn load_balance(&self, address: &Address) -> Result<Decimal> {
        self.bounded("load_balance", self.inner.load_balance(address))
            .await
    }

    async fn load_balances(&self) -> Result<Vec<LedgerEntry>> {
        self.bounded("load_balances", self.inner.load_balances()).await
    }

    async fn save_balances(&self, balances: &BalanceMap) -> Result<()> {
        self.bounded("save_balances", self.inner.save_balances(balances))
            .await
    }

    async fn commit_settlement(&self, batch: &Batch, balances: &BalanceMap) -> Result<()> {
        self.bounded(
            "commit_settlement",
            self.inner.commit_settlement(batch, balances),
        )
        .await
    }

    async fn append_receipt(&self, receipt: &Receipt) -> Result<()> {
        self.bounded("append_receipt", self.inner.append_receipt(receipt))
            .await
    }

    async fn receipts(&self, id: BatchId) -> Result<Vec<Receipt>> {
        self.bounded("receipts", self.inner.receipts(id)).await
    }
}
