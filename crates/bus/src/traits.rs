//! Event bus traits
//!
//! The pipeline publishes and consumes through these two narrow interfaces
//! so that any broker client can be plugged in.

use async_trait::async_trait;
use bytes::Bytes;

use crate::delivery::Subscription;
use crate::error::Result;

/// Publishes encoded records to a topic
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one record
    ///
    /// At-most-once from the caller's point of view: a failed publish is not
    /// retried by the bus.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()>;
}

/// Opens subscriptions to a topic
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Open an ordered, at-least-once stream of deliveries
    async fn subscribe(&self, topic: &str) -> Result<Subscription>;
}
