//! Account-balance ledger.
//!
//! Applying a batch debits each sender and credits each recipient in
//! transaction order; reversing undoes the same transfers newest-first. Both
//! run against a scratch copy of the touched balances and reach the store in
//! a single [`SettlementStore::commit_settlement`] call together with the
//! updated batch record, so a failure at any step leaves no partial effect.
//!
//! All ledger writes are serialized by one async lock. Reads go straight to
//! the store and only ever observe committed state.

use std::collections::BTreeSet;
use std::sync::Arc;

use optiroll_store::{BalanceMap, SettlementStore};
use optiroll_types::{Address, Batch, BatchId, BatchStatus, LedgerEntry, Result, RollupError};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::settlement_guard::SettlementGuard;
use crate::supply_conservation::SupplyConservation;

struct LedgerState {
    guard: SettlementGuard,
    supply: SupplyConservation,
}

/// Balance ledger over a [`SettlementStore`].
pub struct Ledger {
    store: Arc<dyn SettlementStore>,
    state: Mutex<LedgerState>,
}

impl Ledger {
    /// Ledger over an empty store.
    ///
    /// # Errors
    /// `Configuration` if `guard_capacity` is zero.
    pub fn new(store: Arc<dyn SettlementStore>, guard_capacity: usize) -> Result<Self> {
        Self::with_supply(store, guard_capacity, SupplyConservation::new())
    }

    /// Ledger over a store that may already hold balances; their sum becomes
    /// the conservation baseline.
    ///
    /// # Errors
    /// - `Configuration` if `guard_capacity` is zero
    /// - `StoreUnavailable` if the balance scan fails
    pub async fn open(store: Arc<dyn SettlementStore>, guard_capacity: usize) -> Result<Self> {
        if guard_capacity == 0 {
            return Err(zero_capacity());
        }
        let genesis = sum_entries(&store.load_balances().await?)?;
        tracing::info!(%genesis, "Ledger opened");
        Self::with_supply(
            store,
            guard_capacity,
            SupplyConservation::with_genesis(genesis),
        )
    }

    fn with_supply(
        store: Arc<dyn SettlementStore>,
        guard_capacity: usize,
        supply: SupplyConservation,
    ) -> Result<Self> {
        if guard_capacity == 0 {
            return Err(zero_capacity());
        }
        Ok(Self {
            store,
            state: Mutex::new(LedgerState {
                guard: SettlementGuard::new(guard_capacity),
                supply,
            }),
        })
    }

    /// Credit `amount` to `address` from outside the engine. Returns the new
    /// balance.
    ///
    /// # Errors
    /// - `InvalidTransaction` if `amount` is not positive
    /// - `StoreUnavailable` if the store fails (nothing is credited)
    pub async fn deposit(&self, address: Address, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(RollupError::InvalidTransaction {
                reason: format!("deposit amount must be positive, got {amount}"),
            });
        }
        let mut state = self.state.lock().await;
        let mut balances = BalanceMap::new();
        balances.insert(address, self.store.load_balance(&address).await?);
        credit(&mut balances, address, amount)?;
        self.store.save_balances(&balances).await?;
        state.supply.record_deposit(amount);

        let balance = balances.get(&address).copied().unwrap_or_default();
        tracing::info!(address = %address, %amount, %balance, "Deposit credited");
        Ok(balance)
    }

    /// Current balance; unknown accounts hold zero.
    pub async fn balance(&self, address: &Address) -> Result<Decimal> {
        self.store.load_balance(address).await
    }

    /// Every known account, ordered by address.
    pub async fn balances(&self) -> Result<Vec<LedgerEntry>> {
        self.store.load_balances().await
    }

    /// Apply `batch`'s transfers and persist it, atomically.
    ///
    /// `batch` is the record to store and must already carry
    /// `BatchStatus::Verified`. Each transaction is checked against the
    /// running balance of its sender, so a later transfer may spend funds
    /// credited earlier in the same batch.
    ///
    /// # Errors
    /// - `IllegalTransition` if `batch` is not `VERIFIED`
    /// - `BatchAlreadyApplied` if this ledger already applied it
    /// - `InsufficientBalance` for the first transfer a sender cannot cover
    /// - `StoreUnavailable` if the store fails
    ///
    /// On any error no balance and no batch record has changed.
    pub async fn apply_batch(&self, batch: &Batch) -> Result<BalanceMap> {
        expect_status(batch, BatchStatus::Verified, "apply")?;
        let mut state = self.state.lock().await;
        state.guard.check_apply(batch.id)?;

        let mut balances = self.load_touched(batch).await?;
        let before = sum(&balances)?;
        for tx in &batch.transactions {
            let available = balances.get(&tx.sender).copied().unwrap_or_default();
            if available < tx.amount {
                tracing::warn!(
                    batch = %batch.id,
                    sender = %tx.sender,
                    needed = %tx.amount,
                    %available,
                    "Batch rejected by ledger: insufficient balance"
                );
                return Err(RollupError::InsufficientBalance {
                    address: tx.sender,
                    needed: tx.amount,
                    available,
                });
            }
            balances.insert(tx.sender, available - tx.amount);
            credit(&mut balances, tx.recipient, tx.amount)?;
        }
        SupplyConservation::verify_transfer(before, sum(&balances)?)?;

        self.store.commit_settlement(batch, &balances).await?;
        state.guard.mark_applied(batch.id)?;

        tracing::info!(
            batch = %batch.id,
            transactions = batch.transaction_count(),
            accounts = balances.len(),
            "Batch applied to ledger"
        );
        Ok(balances)
    }

    /// Undo `batch`'s transfers and persist it, atomically.
    ///
    /// `batch` must already carry `BatchStatus::Rejected` and must have been
    /// applied earlier (the caller checks the stored status).
    ///
    /// # Errors
    /// - `IllegalTransition` if `batch` is not `REJECTED`
    /// - `BatchAlreadyReversed` if this ledger already reversed it
    /// - `BalanceUnderflow` if a recipient no longer holds what it received
    /// - `StoreUnavailable` if the store fails
    pub async fn reverse_batch(&self, batch: &Batch) -> Result<BalanceMap> {
        expect_status(batch, BatchStatus::Rejected, "reverse")?;
        let mut state = self.state.lock().await;
        state.guard.check_reverse(batch.id)?;

        let mut balances = self.load_touched(batch).await?;
        let before = sum(&balances)?;
        for tx in batch.transactions.iter().rev() {
            let held = balances.get(&tx.recipient).copied().unwrap_or_default();
            if held < tx.amount {
                tracing::error!(
                    batch = %batch.id,
                    recipient = %tx.recipient,
                    amount = %tx.amount,
                    %held,
                    "Reversal would drive balance negative"
                );
                return Err(RollupError::BalanceUnderflow {
                    address: tx.recipient,
                });
            }
            balances.insert(tx.recipient, held - tx.amount);
            credit(&mut balances, tx.sender, tx.amount)?;
        }
        SupplyConservation::verify_transfer(before, sum(&balances)?)?;

        self.store.commit_settlement(batch, &balances).await?;
        state.guard.mark_reversed(batch.id)?;

        tracing::info!(
            batch = %batch.id,
            transactions = batch.transaction_count(),
            "Batch reversed on ledger"
        );
        Ok(balances)
    }

    /// Whether this ledger instance has applied `batch_id`.
    pub async fn is_applied(&self, batch_id: &BatchId) -> bool {
        self.state.lock().await.guard.is_applied(batch_id)
    }

    /// Sum of all balances.
    pub async fn total_supply(&self) -> Result<Decimal> {
        sum_entries(&self.store.load_balances().await?)
    }

    /// Check Σ(balances) against genesis plus deposits.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` if they differ.
    pub async fn verify_supply(&self) -> Result<()> {
        let state = self.state.lock().await;
        let actual = sum_entries(&self.store.load_balances().await?)?;
        state.supply.verify(actual).inspect_err(|err| {
            tracing::error!(error = %err, "Supply conservation violated");
        })
    }

    async fn load_touched(&self, batch: &Batch) -> Result<BalanceMap> {
        let addresses: BTreeSet<Address> = batch
            .transactions
            .iter()
            .flat_map(|tx| [tx.sender, tx.recipient])
            .collect();
        let mut balances = BalanceMap::new();
        for address in addresses {
            let balance = self.store.load_balance(&address).await?;
            balances.insert(address, balance);
        }
        Ok(balances)
    }
}

fn expect_status(batch: &Batch, expected: BatchStatus, action: &'static str) -> Result<()> {
    if batch.status != expected {
        return Err(RollupError::IllegalTransition {
            batch_id: batch.id,
            from: batch.status,
            action,
        });
    }
    Ok(())
}

fn credit(balances: &mut BalanceMap, address: Address, amount: Decimal) -> Result<()> {
    let entry = balances.entry(address).or_default();
    *entry = entry
        .checked_add(amount)
        .ok_or_else(|| RollupError::Internal(format!("balance overflow for {address}")))?;
    Ok(())
}

fn sum(balances: &BalanceMap) -> Result<Decimal> {
    balances.values().try_fold(Decimal::ZERO, |acc, b| {
        acc.checked_add(*b)
            .ok_or_else(|| RollupError::Internal("supply overflow".into()))
    })
}

fn sum_entries(entries: &[LedgerEntry]) -> Result<Decimal> {
    entries.iter().try_fold(Decimal::ZERO, |acc, e| {
        acc.checked_add(e.balance)
            .ok_or_else(|| RollupError::Internal("supply overflow".into()))
    })
}

fn zero_capacity() -> RollupError {
    RollupError::Configuration("settlement guard capacity must be > 0".into())
}
