//! Read-only response shapes. Digests are rendered as `0x`-prefixed hex.

use chrono::{DateTime, Utc};
use optiroll_types::{
    Batch, BatchStatus, Hash32, LedgerEntry, Receipt, ReceiptType, SettlementAnchor,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::requests::TransactionRequest;

pub fn hex32(digest: &Hash32) -> String {
    format!("0x{}", hex::encode(digest))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchView {
    pub id: String,
    pub status: BatchStatus,
    pub transactions_root: String,
    pub transaction_count: usize,
    pub transactions: Vec<TransactionRequest>,
    pub created_at: DateTime<Utc>,
    pub challenge_deadline: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl From<&Batch> for BatchView {
    fn from(batch: &Batch) -> Self {
        Self {
            id: batch.id.to_string(),
            status: batch.status,
            transactions_root: hex32(&batch.transactions_root),
            transaction_count: batch.transaction_count(),
            transactions: batch.transactions.iter().map(TransactionRequest::from).collect(),
            created_at: batch.created_at,
            challenge_deadline: batch.challenge_deadline,
            verified_at: batch.verified_at,
            finalized_at: batch.finalized_at,
            rejection_reason: batch.rejection_reason.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub address: String,
    pub balance: Decimal,
}

impl From<&LedgerEntry> for BalanceView {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            address: entry.address.to_string(),
            balance: entry.balance,
        }
    }
}

/// Inclusion proof for one transaction of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofView {
    pub batch_id: String,
    pub index: usize,
    pub transaction: TransactionRequest,
    pub transactions_root: String,
    pub merkle_proof: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptView {
    pub receipt_type: ReceiptType,
    pub batch_id: String,
    pub detail: Option<String>,
    pub payload_hash: String,
    pub issued_at: DateTime<Utc>,
}

impl From<&Receipt> for ReceiptView {
    fn from(receipt: &Receipt) -> Self {
        Self {
            receipt_type: receipt.receipt_type,
            batch_id: receipt.batch_id.to_string(),
            detail: receipt.detail.clone(),
            payload_hash: hex32(&receipt.payload_hash),
            issued_at: receipt.issued_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorView {
    pub batch_id: String,
    pub transactions_root: String,
    pub transaction_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&SettlementAnchor> for AnchorView {
    fn from(anchor: &SettlementAnchor) -> Self {
        Self {
            batch_id: anchor.batch_id.to_string(),
            transactions_root: hex32(&anchor.transactions_root),
            transaction_count: anchor.transaction_count,
            created_at: anchor.created_at,
        }
    }
}

/// Result of a challenge submission. Failures are reported in-band so an
/// untrusted caller always gets a structured answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// Whether the challenge proved fraud and rejected the batch.
    pub accepted: bool,
    /// Batch status after the call, when the batch could be read.
    pub batch_status: Option<BatchStatus>,
    pub reason: String,
    /// `OR_ERR_xxx` code when the challenge was not accepted.
    pub error_code: Option<String>,
}
