//! Wire requests and their validation.
//!
//! Everything arriving from outside is text: addresses, decimal amounts,
//! hex digests. This module is the only place that text is parsed into
//! domain types; the engine never sees unvalidated input.

use std::str::FromStr;

use optiroll_types::{Address, BatchId, Hash32, Result, RollupError, Transaction, constants};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A transfer as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender: String,
    pub recipient: String,
    /// Decimal string, e.g. `"10"` or `"0.25"`.
    pub amount: String,
}

impl TransactionRequest {
    /// Parse into a domain transaction.
    ///
    /// # Errors
    /// - `InvalidAddress` for a malformed sender or recipient
    /// - `InvalidRequest` for an unparseable amount or a self-transfer
    /// - `InvalidTransaction` for a non-positive or over-precise amount
    pub fn parse(&self) -> Result<Transaction> {
        let sender = Address::parse(&self.sender)?;
        let recipient = Address::parse(&self.recipient)?;
        if sender == recipient {
            return Err(RollupError::InvalidRequest {
                reason: "sender and recipient must differ".into(),
            });
        }
        Transaction::new(sender, recipient, parse_amount(&self.amount)?)
    }

    /// Like [`parse`](Self::parse) but keeps self-transfers, so a challenger
    /// can dispute one that made it into a batch.
    pub fn parse_disputed(&self) -> Result<Transaction> {
        Ok(Transaction {
            sender: Address::parse(&self.sender)?,
            recipient: Address::parse(&self.recipient)?,
            amount: parse_amount(&self.amount)?,
        })
    }
}

impl From<&Transaction> for TransactionRequest {
    fn from(tx: &Transaction) -> Self {
        Self {
            sender: tx.sender.to_string(),
            recipient: tx.recipient.to_string(),
            amount: tx.amount.normalize().to_string(),
        }
    }
}

/// Operator request to commit a set of transfers as one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTransactionsRequest {
    pub transactions: Vec<TransactionRequest>,
}

impl SubmitTransactionsRequest {
    pub fn parse(&self) -> Result<Vec<Transaction>> {
        self.transactions.iter().map(TransactionRequest::parse).collect()
    }
}

/// Dispute of a verified batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub batch_id: String,
    pub disputed_transaction: TransactionRequest,
    /// Sibling digests from leaf to root, hex with optional `0x`.
    pub merkle_proof: Vec<String>,
}

/// Validated form of a [`ChallengeRequest`].
#[derive(Debug, Clone)]
pub struct ParsedChallenge {
    pub batch_id: BatchId,
    pub disputed: Transaction,
    pub proof: Vec<Hash32>,
}

impl ChallengeRequest {
    /// # Errors
    /// `InvalidRequest` for a bad id, proof element, or an over-long proof;
    /// address and amount errors as in [`TransactionRequest::parse`].
    pub fn parse(&self) -> Result<ParsedChallenge> {
        if self.merkle_proof.len() > constants::MAX_PROOF_DEPTH {
            return Err(RollupError::InvalidRequest {
                reason: format!(
                    "proof has {} elements, max {}",
                    self.merkle_proof.len(),
                    constants::MAX_PROOF_DEPTH
                ),
            });
        }
        Ok(ParsedChallenge {
            batch_id: parse_batch_id(&self.batch_id)?,
            disputed: self.disputed_transaction.parse_disputed()?,
            proof: self
                .merkle_proof
                .iter()
                .map(|element| parse_hash32(element))
                .collect::<Result<_>>()?,
        })
    }
}

/// Operator request to credit an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub address: String,
    pub amount: String,
}

impl DepositRequest {
    pub fn parse(&self) -> Result<(Address, Decimal)> {
        let address = Address::parse(&self.address)?;
        let amount = parse_amount(&self.amount)?;
        if amount <= Decimal::ZERO {
            return Err(RollupError::InvalidRequest {
                reason: format!("deposit amount must be positive, got {amount}"),
            });
        }
        Ok((address, amount))
    }
}

/// Operator request to reject a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    pub batch_id: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

pub fn parse_batch_id(s: &str) -> Result<BatchId> {
    BatchId::from_str(s.trim())
}

pub fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim()).map_err(|e| RollupError::InvalidRequest {
        reason: format!("invalid amount {s:?}: {e}"),
    })
}

/// 32-byte digest from 64 hex characters, optionally `0x`-prefixed.
pub fn parse_hash32(s: &str) -> Result<Hash32> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| RollupError::InvalidRequest {
        reason: format!("invalid hex digest {s:?}: {e}"),
    })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| RollupError::InvalidRequest {
        reason: format!("digest must be 32 bytes, got {}", bytes.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sender: &str, recipient: &str, amount: &str) -> TransactionRequest {
        TransactionRequest {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    const ALICE: &str = "0xAAaaAAaaAAaaAAaaAAaaAAaaAAaaAAaaAAaaAAaa";
    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn valid_transaction_parses() {
        let tx = request(ALICE, BOB, "12.5").parse().unwrap();
        assert_eq!(tx.sender.to_string(), ALICE.to_lowercase());
        assert_eq!(tx.amount, Decimal::new(125, 1));
    }

    #[test]
    fn rejects_bad_fields() {
        assert!(matches!(
            request("0x1234", BOB, "1").parse().unwrap_err(),
            RollupError::InvalidAddress(_)
        ));
        assert!(matches!(
            request(ALICE, BOB, "ten").parse().unwrap_err(),
            RollupError::InvalidRequest { .. }
        ));
        assert!(matches!(
            request(ALICE, BOB, "0").parse().unwrap_err(),
            RollupError::InvalidTransaction { .. }
        ));
        assert!(matches!(
            request(ALICE, BOB, "-3").parse().unwrap_err(),
            RollupError::InvalidTransaction { .. }
        ));
        assert!(matches!(
            request(ALICE, ALICE, "1").parse().unwrap_err(),
            RollupError::InvalidRequest { .. }
        ));
    }

    #[test]
    fn disputed_self_transfer_allowed() {
        let tx = request(ALICE, ALICE, "1").parse_disputed().unwrap();
        assert!(tx.is_self_transfer());
    }

    #[test]
    fn round_trips_through_domain() {
        let tx = request(ALICE, BOB, "10.00").parse().unwrap();
        let back = TransactionRequest::from(&tx);
        assert_eq!(back.amount, "10");
        assert_eq!(back.parse().unwrap(), tx);
    }

    #[test]
    fn hash32_parsing() {
        let hex64 = "ab".repeat(32);
        assert_eq!(parse_hash32(&hex64).unwrap(), [0xAB; 32]);
        assert_eq!(parse_hash32(&format!("0x{hex64}")).unwrap(), [0xAB; 32]);
        assert!(parse_hash32("0xabcd").is_err());
        assert!(parse_hash32(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn challenge_request_parses() {
        let id = BatchId::new();
        let req = ChallengeRequest {
            batch_id: id.to_string(),
            disputed_transaction: request(ALICE, BOB, "1"),
            merkle_proof: vec!["00".repeat(32), format!("0x{}", "11".repeat(32))],
        };
        let parsed = req.parse().unwrap();
        assert_eq!(parsed.batch_id, id);
        assert_eq!(parsed.proof, vec![[0u8; 32], [0x11; 32]]);
    }

    #[test]
    fn overlong_proof_refused() {
        let req = ChallengeRequest {
            batch_id: BatchId::new().to_string(),
            disputed_transaction: request(ALICE, BOB, "1"),
            merkle_proof: vec!["00".repeat(32); constants::MAX_PROOF_DEPTH + 1],
        };
        assert!(matches!(
            req.parse().unwrap_err(),
            RollupError::InvalidRequest { .. }
        ));
    }

    #[test]
    fn deposit_must_be_positive() {
        let req = DepositRequest {
            address: BOB.into(),
            amount: "0".into(),
        };
        assert!(req.parse().is_err());
    }
}
