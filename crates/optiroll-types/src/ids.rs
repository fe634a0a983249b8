//! Identifiers used throughout Optiroll.
//!
//! Batch IDs use UUIDv7 for time-ordered lexicographic sorting. Account
//! addresses are raw 20-byte values whose canonical text form is lowercase
//! `0x`-prefixed hex.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RollupError, constants};

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// Globally unique batch identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| RollupError::InvalidRequest {
                reason: format!("bad batch id {s:?}: {e}"),
            })
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address.
///
/// Parsing accepts any hex case; display and serialization always use the
/// lowercase form, so two spellings of one account compare equal and hash
/// to the same transaction identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; constants::ADDRESS_LEN]);

impl Address {
    #[must_use]
    pub fn from_bytes(bytes: [u8; constants::ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::ADDRESS_LEN] {
        &self.0
    }

    /// Parse `0x` + 40 hex characters (case-insensitive).
    pub fn parse(s: &str) -> crate::Result<Self> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| RollupError::InvalidAddress(s.to_string()))?;
        if body.len() != constants::ADDRESS_LEN * 2 {
            return Err(RollupError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; constants::ADDRESS_LEN];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|_| RollupError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Canonical lowercase text form, e.g. `0xab12…`.
    #[must_use]
    pub fn to_lowercase_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// First four bytes, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lowercase_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_lowercase_hex())
    }
}

impl FromStr for Address {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = RollupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_lowercase_hex()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_id_uniqueness() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn batch_id_ordering() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert!(a < b);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn batch_id_timestamp_extraction() {
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let id = BatchId::new();
        let after = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = id.timestamp_ms();
        assert!(
            ts >= before && ts <= after,
            "ts={ts}, before={before}, after={after}"
        );
    }

    #[test]
    fn batch_id_parse() {
        let id = BatchId::new();
        let back: BatchId = id.to_string().parse().unwrap();
        assert_eq!(id, back);
        assert!("not-a-uuid".parse::<BatchId>().is_err());
    }

    #[test]
    fn address_parse_is_case_insensitive() {
        let lower = Address::parse("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap();
        let upper = Address::parse("0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(
            upper.to_string(),
            "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd"
        );
    }

    #[test]
    fn address_rejects_malformed() {
        assert!(Address::parse("abcdefabcdefabcdefabcdefabcdefabcdefabcd").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzcdefabcdefabcdefabcdefabcdefabcdefabcd").is_err());
    }

    #[test]
    fn address_serde_uses_hex_string() {
        let addr = Address::from_bytes([0x11; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x1111111111111111111111111111111111111111\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
        assert!(serde_json::from_str::<Address>("\"0x11\"").is_err());
    }
}
