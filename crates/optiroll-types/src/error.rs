//! Error types for the Optiroll batching engine.
//!
//! All errors use the `OR_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Transaction / commitment tree errors
//! - 2xx: Batch errors
//! - 3xx: Ledger errors
//! - 4xx: Challenge errors
//! - 5xx: Infrastructure errors
//! - 6xx: Adapter (request / authorization) errors
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, BatchId, BatchStatus};

/// Central error enum for all Optiroll operations.
#[derive(Debug, Error)]
pub enum RollupError {
    // =================================================================
    // Transaction / Tree Errors (1xx)
    // =================================================================
    /// A commitment tree was requested over zero transactions.
    #[error("OR_ERR_100: Cannot build a commitment tree over an empty input")]
    EmptyInput,

    /// A proof was requested for a leaf that does not exist.
    #[error("OR_ERR_101: Leaf index {index} out of range for {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    /// The transaction failed validation (bad amount, precision, etc.).
    #[error("OR_ERR_102: Invalid transaction: {reason}")]
    InvalidTransaction { reason: String },

    /// The address is not `0x` followed by 40 hex characters.
    #[error("OR_ERR_103: Invalid address: {0}")]
    InvalidAddress(String),

    // =================================================================
    // Batch Errors (2xx)
    // =================================================================
    /// A batch was requested over zero transactions.
    #[error("OR_ERR_200: Cannot create an empty batch")]
    EmptyBatch,

    /// The batch exceeds the configured maximum size.
    #[error("OR_ERR_201: Batch too large: {size} transactions, max {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// No batch with this ID exists in the store.
    #[error("OR_ERR_202: Batch not found: {0}")]
    BatchNotFound(BatchId),

    /// The requested transition is not legal from the batch's current state.
    #[error("OR_ERR_203: Illegal transition for batch {batch_id}: cannot {action} from {from}")]
    IllegalTransition {
        batch_id: BatchId,
        from: BatchStatus,
        action: &'static str,
    },

    /// The pending pool has already been sealed.
    #[error("OR_ERR_204: Pending pool already sealed")]
    PoolSealed,

    /// The pending pool must be sealed before it can be drained.
    #[error("OR_ERR_205: Pending pool not sealed")]
    PoolNotSealed,

    // =================================================================
    // Ledger Errors (3xx)
    // =================================================================
    /// A sender cannot cover a transfer.
    #[error("OR_ERR_300: Insufficient balance for {address}: need {needed}, have {available}")]
    InsufficientBalance {
        address: Address,
        needed: Decimal,
        available: Decimal,
    },

    /// A reversal would drive a balance negative (corrupted ledger state).
    #[error("OR_ERR_301: Balance underflow for {address}")]
    BalanceUnderflow { address: Address },

    /// The ledger effect of this batch has already been applied.
    #[error("OR_ERR_302: Batch already applied to ledger: {0}")]
    BatchAlreadyApplied(BatchId),

    /// The ledger effect of this batch has already been reversed.
    #[error("OR_ERR_303: Batch already reversed on ledger: {0}")]
    BatchAlreadyReversed(BatchId),

    /// Supply conservation invariant violated. Critical safety alert.
    #[error("OR_ERR_304: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Challenge Errors (4xx)
    // =================================================================
    /// The challenge did not demonstrate fraud.
    #[error("OR_ERR_400: Invalid proof: {reason}")]
    InvalidProof { reason: String },

    /// The batch can no longer be challenged.
    #[error("OR_ERR_401: Challenge window closed for batch {batch_id}")]
    ChallengeWindowClosed {
        batch_id: BatchId,
        deadline: Option<DateTime<Utc>>,
    },

    /// The batch cannot finalize while its challenge window is open.
    #[error("OR_ERR_402: Challenge window open for batch {batch_id} until {deadline}")]
    ChallengeWindowOpen {
        batch_id: BatchId,
        deadline: DateTime<Utc>,
    },

    // =================================================================
    // Infrastructure Errors (5xx)
    // =================================================================
    /// The persistent store failed or timed out.
    #[error("OR_ERR_500: Store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    // =================================================================
    // Adapter Errors (6xx)
    // =================================================================
    /// The caller lacks the capability for this action.
    #[error("OR_ERR_600: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The external request could not be parsed or validated.
    #[error("OR_ERR_601: Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OR_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OR_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("OR_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("OR_ERR_903: I/O error: {0}")]
    Io(String),
}

impl RollupError {
    /// Stable, machine-readable kind name surfaced by the API layer.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EmptyInput",
            Self::IndexOutOfRange { .. } => "IndexOutOfRange",
            Self::InvalidTransaction { .. } => "InvalidTransaction",
            Self::InvalidAddress(_) => "InvalidAddress",
            Self::EmptyBatch => "EmptyBatch",
            Self::BatchTooLarge { .. } => "BatchTooLarge",
            Self::BatchNotFound(_) => "BatchNotFound",
            Self::IllegalTransition { .. } => "IllegalTransition",
            Self::PoolSealed => "PoolSealed",
            Self::PoolNotSealed => "PoolNotSealed",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::BalanceUnderflow { .. } => "BalanceUnderflow",
            Self::BatchAlreadyApplied(_) => "BatchAlreadyApplied",
            Self::BatchAlreadyReversed(_) => "BatchAlreadyReversed",
            Self::SupplyInvariantViolation { .. } => "SupplyInvariantViolation",
            Self::InvalidProof { .. } => "InvalidProof",
            Self::ChallengeWindowClosed { .. } => "ChallengeWindowClosed",
            Self::ChallengeWindowOpen { .. } => "ChallengeWindowOpen",
            Self::StoreUnavailable { .. } => "StoreUnavailable",
            Self::Unauthorized { .. } => "Unauthorized",
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::Internal(_) => "Internal",
            Self::Serialization(_) => "Serialization",
            Self::Configuration(_) => "Configuration",
            Self::Io(_) => "Io",
        }
    }

    /// The `OR_ERR_xxx` code at the start of the display string.
    #[must_use]
    pub fn code(&self) -> String {
        let msg = self.to_string();
        msg.split(':').next().unwrap_or_default().to_string()
    }

    /// Whether the caller may reasonably retry the same call later
    /// (after backoff, or after funding the sender).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::InsufficientBalance { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RollupError>;

// Conversion from std::io::Error
impl From<std::io::Error> for RollupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RollupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = RollupError::BatchNotFound(BatchId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("OR_ERR_202"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = RollupError::InsufficientBalance {
            address: Address::from_bytes([0xAA; 20]),
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("OR_ERR_300"));
        assert!(msg.contains("0xaaaa"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn illegal_transition_display() {
        let err = RollupError::IllegalTransition {
            batch_id: BatchId::new(),
            from: BatchStatus::Finalized,
            action: "verify",
        };
        let msg = format!("{err}");
        assert!(msg.contains("OR_ERR_203"));
        assert!(msg.contains("FINALIZED"));
        assert!(msg.contains("verify"));
    }

    #[test]
    fn code_and_kind() {
        let err = RollupError::StoreUnavailable {
            reason: "timeout".into(),
        };
        assert_eq!(err.code(), "OR_ERR_500");
        assert_eq!(err.kind(), "StoreUnavailable");
        assert!(err.is_retryable());
        assert!(!RollupError::EmptyBatch.is_retryable());
    }

    #[test]
    fn all_errors_have_or_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(RollupError::EmptyInput),
            Box::new(RollupError::IndexOutOfRange {
                index: 3,
                leaf_count: 3,
            }),
            Box::new(RollupError::PoolSealed),
            Box::new(RollupError::InvalidProof {
                reason: "test".into(),
            }),
            Box::new(RollupError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OR_ERR_"),
                "Error missing OR_ERR_ prefix: {msg}"
            );
        }
    }
}
