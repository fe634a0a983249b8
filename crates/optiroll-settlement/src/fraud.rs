//! Fraud evaluation for challenges.
//!
//! A challenge first proves, via an inclusion proof against the batch's
//! recorded root, that the disputed transaction was committed. The policy
//! then decides whether the batch as stored is fraudulent with respect to
//! that transaction.

use std::fmt;

use optiroll_commitment::compute_root;
use optiroll_types::{Batch, Transaction};
use serde::{Deserialize, Serialize};

/// Why a challenged batch is fraudulent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudKind {
    /// The stored transaction list does not hash to the recorded root.
    RootMismatch,
    /// The disputed transaction is committed by the root but missing from
    /// the stored list.
    WithheldTransaction,
    /// The disputed transaction appears more than once in the batch.
    DoubleSpend,
    /// The disputed transaction sends funds to its own sender.
    SelfTransfer,
}

impl fmt::Display for FraudKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootMismatch => write!(f, "transaction list does not match committed root"),
            Self::WithheldTransaction => write!(f, "committed transaction withheld from batch"),
            Self::DoubleSpend => write!(f, "transaction included more than once"),
            Self::SelfTransfer => write!(f, "self-transfer"),
        }
    }
}

/// Outcome of evaluating a proven transaction against a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudVerdict {
    /// No fraud shown; the challenge fails.
    Valid,
    Fraud(FraudKind),
}

/// Decides whether a batch is fraudulent given a transaction proven to be
/// committed by its root.
pub trait FraudPolicy: Send + Sync {
    fn evaluate(&self, batch: &Batch, disputed: &Transaction) -> FraudVerdict;
}

/// Structural checks, first match wins: root mismatch, withheld
/// transaction, double spend, self-transfer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFraudPolicy;

impl FraudPolicy for DefaultFraudPolicy {
    fn evaluate(&self, batch: &Batch, disputed: &Transaction) -> FraudVerdict {
        let root_matches =
            compute_root(&batch.transactions).is_ok_and(|root| root == batch.transactions_root);
        if !root_matches {
            return FraudVerdict::Fraud(FraudKind::RootMismatch);
        }

        let disputed_hash = disputed.canonical_hash();
        let occurrences = batch
            .transactions
            .iter()
            .filter(|tx| tx.canonical_hash() == disputed_hash)
            .count();
        match occurrences {
            0 => FraudVerdict::Fraud(FraudKind::WithheldTransaction),
            1 if disputed.is_self_transfer() => FraudVerdict::Fraud(FraudKind::SelfTransfer),
            1 => FraudVerdict::Valid,
            _ => FraudVerdict::Fraud(FraudKind::DoubleSpend),
        }
    }
}
