//! Netpulse Bus - Event bus interfaces
//!
//! The activity publisher writes encoded windows to a topic through
//! `EventPublisher`; the activity subscriber reads them back through
//! `EventSubscriber`. Each record arrives as a `Delivery` that must be
//! settled with `ack()` or `nack(NackCode)`.
//!
//! `MemoryBus` implements both sides in-process. It is what `netpulse serve`
//! runs on and what the pipeline tests use for fault injection.
//!
//! # Example
//!
//! ```ignore
//! let bus = MemoryBus::new();
//! bus.publish("network-activity", payload).await?;
//!
//! let mut sub = bus.subscribe("network-activity").await?;
//! while let Some(delivery) = sub.recv().await {
//!     delivery.ack();
//! }
//! ```

mod delivery;
mod error;
mod memory;
mod traits;

pub use delivery::{Acknowledger, Delivery, NackCode, Settlement, Subscription};
pub use error::{BusError, Result};
pub use memory::{ACK_LOG_CAPACITY, AckRecord, MemoryBus};
pub use traits::{EventPublisher, EventSubscriber};

// Re-export bytes for convenience
pub use bytes::Bytes;
