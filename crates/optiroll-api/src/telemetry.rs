//! Tracing bootstrap.
//!
//! Installs the global `tracing` subscriber: `RUST_LOG` filtering with a
//! caller-supplied default, human-readable or JSON-lines output on stderr.

use std::str::FromStr;

use optiroll_types::{Result, RollupError};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

impl FromStr for LogFormat {
    type Err = RollupError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(RollupError::Configuration(format!(
                "unknown log format: {other}"
            ))),
        }
    }
}

/// Install the global subscriber. `default_directives` applies when
/// `RUST_LOG` is unset, e.g. `"info"` or `"optiroll_settlement=debug,info"`.
///
/// # Errors
/// `Configuration` if the directives are invalid or a subscriber is
/// already installed.
pub fn init_tracing(default_directives: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives).map_err(|e| {
            RollupError::Configuration(format!("invalid log directives {default_directives:?}: {e}"))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init(),
    };
    installed.map_err(|e| RollupError::Configuration(format!("tracing already initialized: {e}")))?;

    tracing::info!(?format, "Tracing initialized");
    Ok(())
}
