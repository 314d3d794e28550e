//! Bus error types

use thiserror::Error;

/// Result type for bus operations
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur when publishing or subscribing
#[derive(Debug, Error)]
pub enum BusError {
    /// Bus has been closed
    #[error("event bus is closed")]
    Closed,

    /// Record could not be published
    #[error("publish to '{topic}' failed: {message}")]
    Publish {
        /// Target topic
        topic: String,
        /// Error message
        message: String,
    },

    /// Subscription could not be opened
    #[error("subscribe to '{topic}' failed: {message}")]
    Subscribe {
        /// Requested topic
        topic: String,
        /// Error message
        message: String,
    },
}

impl BusError {
    /// Create a Publish error
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a Subscribe error
    pub fn subscribe(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
            message: message.into(),
        }
    }
}
