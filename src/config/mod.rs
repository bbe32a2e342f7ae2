//! Configuration management for tokenledger
//!
//! Settings are layered:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use tokenledger::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Store at: {}", config.store.path.display());
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `TOKENLEDGER__<section>__<key>`:
//! - `TOKENLEDGER__STORE__PATH=/var/lib/tokenledger`
//! - `TOKENLEDGER__STORE__CACHE_SIZE=256MB`
//! - `TOKENLEDGER__LOGGING__FILTER=tokenledger=debug`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/tokenledger.toml`.
//! This can be overridden using the `TOKENLEDGER_CONFIG` environment variable.
//! An `[index]` table, when present, replaces the built-in index set entirely.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, IndexConfig, LoggingConfig, StoreConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_shipped_config() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/tokenledger.toml");
        let config = Config::load_from_path(path).unwrap();
        assert_eq!(config.index["tokens"].fulltext.len(), 2);
        assert_eq!(config.index["graphs"].keys.len(), 2);
    }

    #[test]
    fn test_validation_runs_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[store]
cache_size = 0
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidCacheSize)
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        fs::write(&config_path, "[store\npath = ").unwrap();

        assert!(matches!(
            Config::load_from_path(config_path),
            Err(ConfigError::LoadError(_))
        ));
    }
}
