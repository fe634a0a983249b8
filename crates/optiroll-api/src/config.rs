//! Config file loading.

use std::path::Path;

use optiroll_types::{EngineConfig, Result};

/// Read and validate an [`EngineConfig`] from a JSON file. Missing fields
/// take their defaults; unknown fields are rejected.
///
/// # Errors
/// - `Io` if the file cannot be read
/// - `Configuration` if it does not parse or fails validation
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let config = EngineConfig::from_json_str(&raw)?;
    tracing::info!(path = %path.display(), ?config, "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use optiroll_types::RollupError;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_partial_config_with_defaults() {
        let file = write_config(r#"{ "challenge_period_secs": 60 }"#);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.challenge_period_secs, 60);
        assert_eq!(config.max_batch_size, EngineConfig::default().max_batch_size);
    }

    #[test]
    fn rejects_invalid_values() {
        let file = write_config(r#"{ "store_timeout_ms": 0 }"#);
        assert!(matches!(
            load_config(file.path()),
            Err(RollupError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let file = write_config(r#"{ "challenge_window": 60 }"#);
        assert!(matches!(
            load_config(file.path()),
            Err(RollupError::Configuration(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path().join("absent.json")),
            Err(RollupError::Io(_))
        ));
    }
}
