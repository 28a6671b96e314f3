//! Core error types for keyprobe.
//!
//! Subsystem crates define their own error enums; this module holds the
//! errors raised while building shared types and loading configuration.

use thiserror::Error;

/// Central error type for shared keyprobe types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (malformed codes, bounds, identifiers)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
///
/// Every variant is fatal at startup: the process exits before scanning.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file explicitly requested but not present
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::Validation("code must be numeric".to_string());
        assert_eq!(err.to_string(), "validation error: code must be numeric");

        let err = ConfigError::invalid("scanning.workers", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid config value for scanning.workers: must be greater than zero"
        );
    }

    #[test]
    fn test_error_from_config() {
        let core_err: CoreError = ConfigError::NoConfigDir.into();
        assert!(matches!(core_err, CoreError::Config(_)));
    }
}
