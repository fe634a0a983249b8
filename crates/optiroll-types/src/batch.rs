//! Batch lifecycle types.
//!
//! Every batch moves through a forward-only state machine:
//!
//! ```text
//!   ┌─────────┐ verify ┌──────────┐ finalize ┌───────────┐
//!   │ PENDING ├───────▶│ VERIFIED ├─────────▶│ FINALIZED │
//!   └────┬────┘        └────┬─────┘          └───────────┘
//!        │ reject           │ challenge / reject
//!        ▼                  ▼
//!   ┌──────────────────────────┐
//!   │         REJECTED         │
//!   └──────────────────────────┘
//! ```
//!
//! Ledger effects are applied on `PENDING → VERIFIED` and reversed on
//! `VERIFIED → REJECTED`. `FINALIZED` and `REJECTED` are terminal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BatchId, Hash32, RollupError, Transaction};

/// The lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Committed and stored; no ledger effect yet.
    Pending,
    /// Ledger effect applied; challenge window open.
    Verified,
    /// Challenge window elapsed without a successful challenge. Terminal.
    Finalized,
    /// Rejected by challenge or operator; any ledger effect reversed. Terminal.
    Rejected,
}

impl BatchStatus {
    /// Can a batch in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Verified | Self::Rejected)
                | (Self::Verified, Self::Finalized | Self::Rejected)
        )
    }

    /// `FINALIZED` and `REJECTED` accept no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Rejected)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Verified => write!(f, "VERIFIED"),
            Self::Finalized => write!(f, "FINALIZED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl FromStr for BatchStatus {
    type Err = RollupError;

    /// Case-insensitive: `pending`, `VERIFIED`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "finalized" => Ok(Self::Finalized),
            "rejected" => Ok(Self::Rejected),
            other => Err(RollupError::InvalidRequest {
                reason: format!("unknown batch status: {other}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// An ordered set of transactions committed by a single root digest.
///
/// The transaction list never changes after creation; only the lifecycle
/// fields (`status`, `rejection_reason`, `challenge_deadline`, timestamps)
/// are updated, and only by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: BatchId,
    /// Commitment-tree root over `transactions`.
    pub transactions_root: Hash32,
    /// The committed transactions, in commitment order.
    pub transactions: Vec<Transaction>,
    /// When the batch was created.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: BatchStatus,
    /// Why the batch was rejected, if it was.
    pub rejection_reason: Option<String>,
    /// End of the challenge window; set on verification.
    pub challenge_deadline: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// Number of committed transactions.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Sum of all transfer amounts.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.transactions.iter().map(|tx| tx.amount).sum()
    }

    /// Whether the batch is `VERIFIED` and `now` is strictly before its deadline.
    #[must_use]
    pub fn challenge_window_open(&self, now: DateTime<Utc>) -> bool {
        self.status == BatchStatus::Verified
            && self.challenge_deadline.is_some_and(|deadline| now < deadline)
    }

    /// Metadata-only record handed to the primary settlement layer.
    #[must_use]
    pub fn anchor(&self) -> SettlementAnchor {
        SettlementAnchor {
            batch_id: self.id,
            transactions_root: self.transactions_root,
            transaction_count: self.transactions.len(),
            created_at: self.created_at,
        }
    }

    /// Root as lowercase hex, for logs and API responses.
    #[must_use]
    pub fn root_hex(&self) -> String {
        hex::encode(self.transactions_root)
    }
}

// ---------------------------------------------------------------------------
// SettlementAnchor: what the primary ledger sees
// ---------------------------------------------------------------------------

/// Lightweight record of a batch for anchoring on the primary ledger.
///
/// Contains only the root and metadata, not the transaction list. The
/// settlement layer stores the root and later signals verification and
/// finalization back through [`SettlementEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementAnchor {
    pub batch_id: BatchId,
    pub transactions_root: Hash32,
    pub transaction_count: usize,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SettlementEvent: signals from the primary ledger
// ---------------------------------------------------------------------------

/// Confirmation signals emitted by the primary settlement layer.
///
/// Delivery is at-least-once; the lifecycle treats repeats as no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementEvent {
    /// The anchored root was accepted; apply ledger effects.
    Verified { batch_id: BatchId },
    /// The on-chain challenge period elapsed.
    Finalized { batch_id: BatchId },
}

impl SettlementEvent {
    #[must_use]
    pub fn batch_id(&self) -> BatchId {
        match self {
            Self::Verified { batch_id } | Self::Finalized { batch_id } => *batch_id,
        }
    }
}
