//! Transfer transactions and their canonical identity hash.
//!
//! A [`Transaction`] has no assigned ID. Its identity is the keccak-256
//! hash of `sender || recipient || amount` in canonical text form, which is
//! also the leaf value committed by the batch's commitment tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::{Address, Result, RollupError, constants};

/// A 32-byte digest (leaf, interior node, or root of a commitment tree).
pub type Hash32 = [u8; 32];

/// keccak-256 over an arbitrary byte string.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash32 {
    let result = Keccak256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// A value transfer between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Account debited by `amount`.
    pub sender: Address,
    /// Account credited by `amount`.
    pub recipient: Address,
    /// Strictly positive amount, at most `AMOUNT_PRECISION` fractional digits.
    pub amount: Decimal,
}

impl Transaction {
    /// Build a transaction, rejecting non-positive or over-precise amounts.
    pub fn new(sender: Address, recipient: Address, amount: Decimal) -> Result<Self> {
        let tx = Self {
            sender,
            recipient,
            amount,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Check the amount rules. Fields are public, so records read back from
    /// storage or decoded from the wire should be re-validated.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(RollupError::InvalidTransaction {
                reason: format!("amount must be positive, got {}", self.amount),
            });
        }
        if self.amount.normalize().scale() > constants::AMOUNT_PRECISION {
            return Err(RollupError::InvalidTransaction {
                reason: format!(
                    "amount {} exceeds {} fractional digits",
                    self.amount,
                    constants::AMOUNT_PRECISION
                ),
            });
        }
        Ok(())
    }

    /// Canonical identity: `keccak256(sender_lc || recipient_lc || amount)`.
    ///
    /// The amount is normalized first so `10` and `10.00` hash identically,
    /// matching `Decimal` equality.
    #[must_use]
    pub fn canonical_hash(&self) -> Hash32 {
        let mut hasher = Keccak256::new();
        hasher.update(self.sender.to_lowercase_hex().as_bytes());
        hasher.update(self.recipient.to_lowercase_hex().as_bytes());
        hasher.update(self.amount.normalize().to_string().as_bytes());
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Whether sender and recipient are the same account.
    #[must_use]
    pub fn is_self_transfer(&self) -> bool {
        self.sender == self.recipient
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tx[{}] {} -> {} : {}",
            hex::encode(&self.canonical_hash()[..4]),
            self.sender.short(),
            self.recipient.short(),
            self.amount,
        )
    }
}

/// Dummy transactions for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Transaction {
    /// Transfer of `amount` between two random accounts.
    pub fn dummy(amount: Decimal) -> Self {
        Self {
            sender: Address::random(),
            recipient: Address::random(),
            amount,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// A random address. **Never use in production.**
    pub fn random() -> Self {
        Self::from_bytes(rand::random::<[u8; constants::ADDRESS_LEN]>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn new_rejects_zero_and_negative() {
        assert!(Transaction::new(addr(1), addr(2), Decimal::ZERO).is_err());
        let err = Transaction::new(addr(1), addr(2), Decimal::new(-5, 0)).unwrap_err();
        assert!(matches!(err, RollupError::InvalidTransaction { .. }));
    }

    #[test]
    fn new_rejects_excess_precision() {
        // 1e-19
        let tiny = Decimal::new(1, 19);
        assert!(Transaction::new(addr(1), addr(2), tiny).is_err());
        let ok = Decimal::new(1, 18);
        assert!(Transaction::new(addr(1), addr(2), ok).is_ok());
    }

    #[test]
    fn canonical_hash_is_deterministic() {
        let tx = Transaction::new(addr(1), addr(2), Decimal::new(10, 0)).unwrap();
        assert_eq!(tx.canonical_hash(), tx.clone().canonical_hash());
    }

    #[test]
    fn canonical_hash_ignores_trailing_zeros() {
        let a = Transaction::new(addr(1), addr(2), Decimal::new(10, 0)).unwrap();
        let b = Transaction::new(addr(1), addr(2), Decimal::new(1000, 2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical_hash(), b.canonical_hash());
    }

    #[test]
    fn canonical_hash_covers_every_field() {
        let base = Transaction::new(addr(1), addr(2), Decimal::new(10, 0)).unwrap();
        let mut other_sender = base.clone();
        other_sender.sender = addr(3);
        let mut other_recipient = base.clone();
        other_recipient.recipient = addr(3);
        let mut other_amount = base.clone();
        other_amount.amount = Decimal::new(11, 0);

        let h = base.canonical_hash();
        assert_ne!(h, other_sender.canonical_hash());
        assert_ne!(h, other_recipient.canonical_hash());
        assert_ne!(h, other_amount.canonical_hash());
    }

    #[test]
    fn direction_matters() {
        let ab = Transaction::new(addr(1), addr(2), Decimal::ONE).unwrap();
        let ba = Transaction::new(addr(2), addr(1), Decimal::ONE).unwrap();
        assert_ne!(ab.canonical_hash(), ba.canonical_hash());
    }

    #[test]
    fn self_transfer_detected() {
        let tx = Transaction::new(addr(1), addr(1), Decimal::ONE).unwrap();
        assert!(tx.is_self_transfer());
    }

    #[test]
    fn serde_roundtrip_keeps_identity() {
        let tx = Transaction::dummy(Decimal::new(12345, 2));
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.canonical_hash(), back.canonical_hash());
    }
}
