//! Deliveries and subscriptions
//!
//! A `Delivery` is one record handed to a subscriber. It must be settled
//! exactly once with `ack()` or `nack(code)`; both consume it. A delivery
//! dropped without settling is released back to its bus.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

/// Reason a record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NackCode {
    /// Record could not be decoded or has an unexpected type; never retried
    UnknownType,
    /// Record was valid but could not be applied; may be redelivered
    Unprocessed,
}

impl NackCode {
    /// Get the code name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownType => "UNKNOWN_TYPE",
            Self::Unprocessed => "UNPROCESSED",
        }
    }
}

impl fmt::Display for NackCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a delivery was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    Nack(NackCode),
}

/// Receives settlements for deliveries handed out by a bus
pub trait Acknowledger: Send + Sync {
    /// Record the outcome of delivery `id`
    fn settle(&self, id: u64, settlement: Settlement);

    /// Delivery `id` was dropped without being settled
    fn release(&self, id: u64);
}

/// One record handed to a subscriber
pub struct Delivery {
    id: u64,
    attempt: u32,
    payload: Bytes,
    acker: Arc<dyn Acknowledger>,
    settled: bool,
}

impl Delivery {
    /// Create a delivery settled through `acker`
    pub fn new(id: u64, attempt: u32, payload: Bytes, acker: Arc<dyn Acknowledger>) -> Self {
        Self {
            id,
            attempt,
            payload,
            acker,
            settled: false,
        }
    }

    /// Bus-assigned record id
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Delivery attempt, starting at 1
    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Encoded record
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Confirm the record was applied
    pub fn ack(mut self) {
        self.settle(Settlement::Ack);
    }

    /// Reject the record
    pub fn nack(mut self, code: NackCode) {
        self.settle(Settlement::Nack(code));
    }

    /// Drop without notifying the bus
    ///
    /// For deliveries that never reached a subscriber.
    pub(crate) fn disarm(mut self) {
        self.settled = true;
    }

    fn settle(&mut self, settlement: Settlement) {
        self.settled = true;
        self.acker.settle(self.id, settlement);
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if !self.settled {
            self.acker.release(self.id);
        }
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("id", &self.id)
            .field("attempt", &self.attempt)
            .field("len", &self.payload.len())
            .finish()
    }
}

/// Ordered stream of deliveries for one topic
///
/// The stream ends (`recv` returns `None`) when the bus stops feeding it.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: mpsc::UnboundedReceiver<Delivery>,
}

impl Subscription {
    /// Wrap a delivery channel
    pub fn new(topic: impl Into<String>, receiver: mpsc::UnboundedReceiver<Delivery>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    /// Topic this subscription reads
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next delivery
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }
}
