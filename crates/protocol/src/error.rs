//! Protocol error types
//!
//! Errors that can occur when encoding or decoding activity events.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Network name could not be parsed
    #[error("unknown network: {0:?}")]
    UnknownNetwork(String),

    /// Event carries a mimetype this decoder does not handle
    #[error("unhandled mimetype: expected {expected}, got {actual}")]
    UnhandledMimetype {
        expected: &'static str,
        actual: &'static str,
    },

    /// Event type name or major version does not match
    #[error("unhandled event type: {name} v{major_version}")]
    UnhandledEventType { name: String, major_version: u32 },

    /// Serialization failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// Payload could not be deserialized
    #[error("decode failed: {0}")]
    Decode(String),
}

impl ProtocolError {
    /// Create an unknown network error
    #[inline]
    pub fn unknown_network(name: impl Into<String>) -> Self {
        Self::UnknownNetwork(name.into())
    }

    /// Create an encode error
    #[inline]
    pub fn encode(msg: impl ToString) -> Self {
        Self::Encode(msg.to_string())
    }

    /// Create a decode error
    #[inline]
    pub fn decode(msg: impl ToString) -> Self {
        Self::Decode(msg.to_string())
    }

    /// Check if the error is caused by the record itself
    ///
    /// Such records will never become valid, so retrying them is pointless.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::UnhandledMimetype { .. } | Self::UnhandledEventType { .. } | Self::Decode(_)
        )
    }
}
