//! Pipeline error types
//!
//! Errors raised while applying a record or starting the workers. Record
//! errors are split into permanent (the record itself is bad) and transient
//! (the store could not be reached); the subscriber nacks them differently.

use std::time::Duration;

use thiserror::Error;

use netpulse_bus::BusError;
use netpulse_protocol::ProtocolError;
use netpulse_store::StoreError;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Record could not be decoded or has an unexpected type
    #[error("could not parse network activity record: {0}")]
    Decode(#[source] ProtocolError),

    /// Store call failed
    #[error("store call for activity month '{month}' failed: {source}")]
    Store {
        /// Month being read or written
        month: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Store call did not complete in time
    #[error("store call for activity month '{month}' timed out after {timeout:?}")]
    StoreTimeout {
        /// Month being read or written
        month: String,
        /// Configured bound
        timeout: Duration,
    },

    /// Bus operation failed
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Pipeline configuration cannot be used
    #[error("invalid activity configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Create a Store error
    pub fn store(month: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            month: month.into(),
            source,
        }
    }

    /// Check if retrying the same record can never succeed
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::Decode(e) => e.is_permanent(),
            Self::Store { source, .. } => source.is_invalid_record(),
            _ => false,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
