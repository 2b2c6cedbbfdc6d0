use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::ProcessorConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl ProcessorConfig {
    /// Parses and validates a TOML document.
    ///
    /// Missing keys fall back to [`ProcessorConfig::default`].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProcessorConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The name is not blank
    /// - Limits, when set, are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Processor name must not be empty".to_string(),
            });
        }

        if self.max_concurrent_effects == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "max_concurrent_effects must be at least 1".to_string(),
            });
        }

        if self.backlog_warn_threshold == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "backlog_warn_threshold must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
