//! Supply conservation invariant checker.
//!
//! ```text
//! Σ(balances) == genesis + Σ(deposits)
//! ```
//!
//! Batches only move value between accounts, so the sum of all balances
//! must stay fixed across every apply and reverse. If this breaks, the
//! ledger is corrupt and callers should halt.

use optiroll_types::{Result, RollupError};
use rust_decimal::Decimal;

/// Tracks total supply and validates conservation.
pub struct SupplyConservation {
    /// Supply already present in the store when the tracker started.
    genesis: Decimal,
    /// Total deposits since start.
    deposits: Decimal,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::with_genesis(Decimal::ZERO)
    }

    /// Start from an existing supply (e.g. balances loaded on restart).
    #[must_use]
    pub fn with_genesis(genesis: Decimal) -> Self {
        Self {
            genesis,
            deposits: Decimal::ZERO,
        }
    }

    pub fn record_deposit(&mut self, amount: Decimal) {
        self.deposits += amount;
    }

    /// Expected sum of all balances.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.genesis + self.deposits
    }

    #[must_use]
    pub fn total_deposits(&self) -> Decimal {
        self.deposits
    }

    /// Verify the actual sum of balances against the expected supply.
    ///
    /// # Errors
    /// Returns [`RollupError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply();
        if actual_supply != expected {
            return Err(RollupError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual_supply} != expected {expected} \
                     (genesis={}, deposits={})",
                    self.genesis, self.deposits,
                ),
            });
        }
        Ok(())
    }

    /// Verify that a batch left the touched accounts' total unchanged.
    ///
    /// # Errors
    /// Returns [`RollupError::SupplyInvariantViolation`] if `before != after`.
    pub fn verify_transfer(before: Decimal, after: Decimal) -> Result<()> {
        if before != after {
            return Err(RollupError::SupplyInvariantViolation {
                reason: format!("batch moved supply from {before} to {after}"),
            });
        }
        Ok(())
    }
}

impl Default for SupplyConservation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        assert_eq!(sc.expected_supply(), Decimal::ZERO);
        assert!(sc.verify(Decimal::ZERO).is_ok());
    }

    #[test]
    fn deposits_increase_expected() {
        let mut sc = SupplyConservation::new();
        sc.record_deposit(Decimal::new(1000, 0));
        sc.record_deposit(Decimal::new(500, 0));
        assert_eq!(sc.expected_supply(), Decimal::new(1500, 0));
        assert_eq!(sc.total_deposits(), Decimal::new(1500, 0));
    }

    #[test]
    fn genesis_counts_toward_supply() {
        let mut sc = SupplyConservation::with_genesis(Decimal::new(200, 0));
        sc.record_deposit(Decimal::new(50, 0));
        assert!(sc.verify(Decimal::new(250, 0)).is_ok());
    }

    #[test]
    fn verify_fails_on_mismatch() {
        let mut sc = SupplyConservation::new();
        sc.record_deposit(Decimal::new(100, 0));
        let err = sc.verify(Decimal::new(101, 0)).unwrap_err();
        assert!(matches!(err, RollupError::SupplyInvariantViolation { .. }));
        assert!(format!("{err}").contains("OR_ERR_304"));
    }

    #[test]
    fn transfer_check() {
        assert!(SupplyConservation::verify_transfer(Decimal::TEN, Decimal::TEN).is_ok());
        assert!(SupplyConservation::verify_transfer(Decimal::TEN, Decimal::ONE).is_err());
    }
}
