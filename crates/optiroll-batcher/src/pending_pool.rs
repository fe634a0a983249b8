//! Pending pool for client transactions awaiting commitment.
//!
//! Transactions are appended in arrival order. Once the pool is sealed no
//! more can be added; the batcher drains it into a committed batch. Order
//! inside the pool is the order the commitment tree will see.

use optiroll_types::{Result, RollupError, Transaction, constants};

/// Append-only collection of transactions before commitment.
pub struct PendingPool {
    /// Transactions in arrival order.
    transactions: Vec<Transaction>,
    sealed: bool,
    /// Maximum number of transactions the pool accepts.
    max_transactions: usize,
}

impl PendingPool {
    /// Create an empty pool with the default maximum batch size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(constants::DEFAULT_MAX_BATCH_SIZE)
    }

    /// Create a pool that holds at most `max_transactions`.
    #[must_use]
    pub fn with_capacity(max_transactions: usize) -> Self {
        Self {
            transactions: Vec::new(),
            sealed: false,
            max_transactions,
        }
    }

    /// Append a validated transaction.
    ///
    /// # Errors
    /// - `PoolSealed` if the pool has been sealed
    /// - `BatchTooLarge` if the pool is at capacity
    /// - `InvalidTransaction` if the amount is malformed
    pub fn push(&mut self, transaction: Transaction) -> Result<()> {
        if self.sealed {
            return Err(RollupError::PoolSealed);
        }
        if self.transactions.len() >= self.max_transactions {
            return Err(RollupError::BatchTooLarge {
                size: self.transactions.len() + 1,
                max: self.max_transactions,
            });
        }
        transaction.validate()?;
        self.transactions.push(transaction);
        Ok(())
    }

    /// Seal the pool. No more transactions can be added after this.
    ///
    /// # Errors
    /// Returns `PoolSealed` if already sealed.
    pub fn seal(&mut self) -> Result<()> {
        if self.sealed {
            return Err(RollupError::PoolSealed);
        }
        self.sealed = true;
        Ok(())
    }

    /// Take every transaction out of a sealed pool. The pool stays sealed
    /// until [`reset`](Self::reset).
    ///
    /// # Errors
    /// Returns `PoolNotSealed` if the pool is still open.
    pub fn drain(&mut self) -> Result<Vec<Transaction>> {
        if !self.sealed {
            return Err(RollupError::PoolNotSealed);
        }
        Ok(std::mem::take(&mut self.transactions))
    }

    /// Put drained transactions back at the front and reopen the pool.
    /// Used when committing a drained set fails.
    pub fn restore(&mut self, mut transactions: Vec<Transaction>) {
        transactions.append(&mut self.transactions);
        self.transactions = transactions;
        self.sealed = false;
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Pending transactions, in arrival order.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Clear and reopen the pool.
    pub fn reset(&mut self) {
        self.transactions.clear();
        self.sealed = false;
    }
}

impl Default for PendingPool {
    fn default() -> Self {
        Self::new()
    }
}
