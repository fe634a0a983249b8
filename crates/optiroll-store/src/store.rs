//! The store contract consumed by the batcher, ledger and lifecycle.

use std::collections::BTreeMap;

use async_trait::async_trait;
use optiroll_types::{Address, Batch, BatchId, LedgerEntry, Receipt, Result};
use rust_decimal::Decimal;

/// Balances keyed by address. Ordered so multi-key writes always touch
/// accounts in the same order.
pub type BalanceMap = BTreeMap<Address, Decimal>;

/// Persistent storage for batches, balances and receipts.
///
/// Implementations must make `save_balances` and `commit_settlement`
/// atomic: after an error, none of the keys in the call may have changed.
/// Failures of the backing store are reported as
/// [`RollupError::StoreUnavailable`](optiroll_types::RollupError::StoreUnavailable).
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Load a batch, or `None` if no batch has this ID.
    async fn load_batch(&self, id: BatchId) -> Result<Option<Batch>>;

    /// Insert or overwrite a batch record.
    async fn save_batch(&self, batch: &Batch) -> Result<()>;

    /// All batches, oldest first.
    async fn list_batches(&self) -> Result<Vec<Batch>>;

    /// Balance of `address`; unknown accounts hold zero.
    async fn load_balance(&self, address: &Address) -> Result<Decimal>;

    /// Every known account, ordered by address.
    async fn load_balances(&self) -> Result<Vec<LedgerEntry>>;

    /// Atomically write several balances.
    async fn save_balances(&self, balances: &BalanceMap) -> Result<()>;

    /// Atomically write a batch record together with the balances its
    /// settlement produced.
    async fn commit_settlement(&self, batch: &Batch, balances: &BalanceMap) -> Result<()>;

    /// Append to a batch's audit trail.
    async fn append_receipt(&self, receipt: &Receipt) -> Result<()>;

    /// A batch's audit trail, in issue order.
    async fn receipts(&self, id: BatchId) -> Result<Vec<Receipt>>;
}
