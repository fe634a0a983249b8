//! Ledger balance types.
//!
//! Optiroll is single-asset: each account holds one balance, which batch
//! settlement debits and credits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Address;

/// A single account balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub address: Address,
    /// Never negative.
    pub balance: Decimal,
}

impl LedgerEntry {
    /// A zero balance for `address`.
    #[must_use]
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            balance: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.balance.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_entry_is_zero() {
        let entry = LedgerEntry::empty(Address::from_bytes([1; 20]));
        assert_eq!(entry.balance, Decimal::ZERO);
        assert!(entry.is_zero());
    }

    #[test]
    fn ledger_entry_serde_roundtrip() {
        let entry = LedgerEntry {
            address: Address::from_bytes([2; 20]),
            balance: Decimal::new(12345, 2), // 123.45
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
