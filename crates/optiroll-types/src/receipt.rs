//! Receipt types for the Optiroll audit trail.
//!
//! Every lifecycle transition and every challenge outcome produces a
//! [`Receipt`] appended to the store, so the history of a batch can be
//! reconstructed and independently checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Batch, BatchId};

/// The type of action this receipt proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptType {
    /// A batch was committed and stored as pending.
    BatchSubmitted,
    /// A batch was verified and its ledger effect applied.
    BatchVerified,
    /// A batch's challenge window elapsed and it finalized.
    BatchFinalized,
    /// A batch was rejected and any ledger effect reversed.
    BatchRejected,
    /// A challenge against a batch failed; the batch is unaffected.
    ChallengeRejected,
}

impl std::fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchSubmitted => write!(f, "BATCH_SUBMITTED"),
            Self::BatchVerified => write!(f, "BATCH_VERIFIED"),
            Self::BatchFinalized => write!(f, "BATCH_FINALIZED"),
            Self::BatchRejected => write!(f, "BATCH_REJECTED"),
            Self::ChallengeRejected => write!(f, "CHALLENGE_REJECTED"),
        }
    }
}

/// Proof that an action occurred on a batch.
///
/// `payload_hash` is SHA-256 over
/// `"optiroll:receipt:v1:" || type || batch_id || root || status || detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_type: ReceiptType,
    pub batch_id: BatchId,
    /// Free-form context (rejection reason, challenge failure, ...).
    pub detail: Option<String>,
    pub payload_hash: [u8; 32],
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    /// Issue a receipt for `batch` in its current state.
    #[must_use]
    pub fn issue(
        receipt_type: ReceiptType,
        batch: &Batch,
        detail: Option<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let payload_hash = Self::compute_payload_hash(receipt_type, batch, detail.as_deref());
        Self {
            receipt_type,
            batch_id: batch.id,
            detail,
            payload_hash,
            issued_at,
        }
    }

    fn compute_payload_hash(
        receipt_type: ReceiptType,
        batch: &Batch,
        detail: Option<&str>,
    ) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"optiroll:receipt:v1:");
        hasher.update(receipt_type.to_string().as_bytes());
        hasher.update(batch.id.0.as_bytes());
        hasher.update(batch.transactions_root);
        hasher.update(batch.status.to_string().as_bytes());
        if let Some(detail) = detail {
            hasher.update(detail.as_bytes());
        }
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Recompute the payload hash against `batch` and compare.
    #[must_use]
    pub fn matches(&self, batch: &Batch) -> bool {
        self.batch_id == batch.id
            && Self::compute_payload_hash(self.receipt_type, batch, self.detail.as_deref())
                == self.payload_hash
    }
}
