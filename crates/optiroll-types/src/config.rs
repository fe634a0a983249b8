//! Configuration for the Optiroll engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, RollupError, constants};

/// Engine policy and resource limits.
///
/// All fields have defaults, so a config file only needs to name what it
/// overrides:
///
/// ```json
/// { "challenge_period_secs": 3600, "store_timeout_ms": 2000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Length of the challenge window opened by verification.
    pub challenge_period_secs: u64,
    /// Upper bound on any single store call.
    pub store_timeout_ms: u64,
    /// Maximum transactions per batch.
    pub max_batch_size: usize,
    /// Applied batch ids remembered by the ledger's settlement guard.
    pub settlement_guard_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            challenge_period_secs: constants::DEFAULT_CHALLENGE_PERIOD_SECS,
            store_timeout_ms: constants::DEFAULT_STORE_TIMEOUT_MS,
            max_batch_size: constants::DEFAULT_MAX_BATCH_SIZE,
            settlement_guard_capacity: constants::DEFAULT_SETTLEMENT_GUARD_CAPACITY,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn challenge_period(&self) -> Duration {
        Duration::from_secs(self.challenge_period_secs)
    }

    /// Challenge period as a `chrono` duration, for deadline arithmetic.
    pub fn challenge_period_chrono(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.challenge_period()).map_err(|e| {
            RollupError::Configuration(format!("challenge period out of range: {e}"))
        })
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Reject zero durations and sizes.
    pub fn validate(&self) -> Result<()> {
        if self.challenge_period_secs == 0 {
            return Err(RollupError::Configuration(
                "challenge_period_secs must be > 0".into(),
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(RollupError::Configuration(
                "store_timeout_ms must be > 0".into(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(RollupError::Configuration(
                "max_batch_size must be > 0".into(),
            ));
        }
        if self.settlement_guard_capacity == 0 {
            return Err(RollupError::Configuration(
                "settlement_guard_capacity must be > 0".into(),
            ));
        }
        self.challenge_period_chrono()?;
        Ok(())
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RollupError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.challenge_period().as_secs(), 7 * 24 * 3600);
        assert_eq!(cfg.store_timeout().as_millis(), 5000);
        assert_eq!(cfg.max_batch_size, 10_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"challenge_period_secs": 60}"#).unwrap();
        assert_eq!(cfg.challenge_period_secs, 60);
        assert_eq!(cfg.max_batch_size, constants::DEFAULT_MAX_BATCH_SIZE);
    }

    #[test]
    fn zero_values_rejected() {
        let err = EngineConfig::from_json_str(r#"{"store_timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, RollupError::Configuration(_)));
        let cfg = EngineConfig {
            max_batch_size: 0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(EngineConfig::from_json_str(r#"{"challenge_period": 60}"#).is_err());
    }

    #[test]
    fn chrono_period_matches() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.challenge_period_chrono().unwrap(), chrono::Duration::days(7));
    }
}
