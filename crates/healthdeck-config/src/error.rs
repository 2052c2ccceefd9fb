//! Error types for configuration loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Reading the configuration file failed.
    #[error("failed to read configuration file")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The configuration file was not valid YAML for the expected shape.
    #[error("failed to parse configuration file")]
    Parse {
        /// File that could not be parsed.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        value: Option<&str>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            field,
            value: value.map(str::to_string),
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_field_message_names_field_and_reason() {
        let err = ConfigError::invalid("poll_interval", Some("0"), "must_be_positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration field 'poll_interval': must_be_positive"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn io_error_exposes_source() {
        let err = ConfigError::Io {
            path: PathBuf::from("healthdeck.yaml"),
            source: io::Error::other("denied"),
        };
        assert_eq!(err.to_string(), "failed to read configuration file");
        assert!(err.source().is_some());
    }
}
