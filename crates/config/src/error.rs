//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Activity publishing is enabled but no topic was configured
    #[error("activity is enabled but no topic is configured")]
    MissingTopic,

    /// Validation error - required field missing
    #[error("{component} is missing required field '{field}'")]
    MissingField {
        /// Config section (e.g., "activity", "store")
        component: &'static str,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} has invalid {field}: {message}")]
    InvalidValue {
        /// Config section
        component: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(component: &'static str, field: &'static str) -> Self {
        Self::MissingField { component, field }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_topic_error() {
        let err = ConfigError::MissingTopic;
        assert!(err.to_string().contains("no topic"));
    }

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("store", "path");
        assert!(err.to_string().contains("store"));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("activity", "network", "unknown network: \"devnet\"");
        assert!(err.to_string().contains("activity"));
        assert!(err.to_string().contains("network"));
        assert!(err.to_string().contains("devnet"));
    }
}
