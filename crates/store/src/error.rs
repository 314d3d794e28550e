//! Store error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur when reading or writing month buckets
#[derive(Debug, Error)]
pub enum StoreError {
    /// No bucket exists for the month
    #[error("activity month '{0}' not found")]
    NotFound(String),

    /// Month key is not a valid `YYYY-MM` string
    #[error("invalid month key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key
        key: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Bucket is missing fields required to store it
    #[error("incomplete record: {0}")]
    IncompleteRecord(&'static str),

    /// Filesystem error in the disk store
    #[error("io error at '{}': {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Bucket could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store cannot serve requests right now
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an InvalidKey error
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }

    /// Create an Io error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an Unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Check if this is a not-found error
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if the key or bucket itself was rejected, so retrying cannot help
    #[inline]
    pub fn is_invalid_record(&self) -> bool {
        matches!(self, Self::InvalidKey { .. } | Self::IncompleteRecord(_))
    }
}
