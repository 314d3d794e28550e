//! Netpulse Protocol - Core types for network activity telemetry
//!
//! This crate provides the types that flow between the activity publisher
//! and the activity subscriber:
//! - `Activity` - Lookup, Search, Register
//! - `Network` - TestNet, MainNet, RVASP
//! - `ActivityCount` - Per-kind occurrence counters
//! - `NetworkActivity` - One aggregation window, the unit sent over the bus
//! - `Event` - Versioned envelope carrying an encoded `NetworkActivity`
//!
//! # Wire Format
//!
//! ```text
//! Event (bincode)
//! ├── event_type: { name: "NetworkActivity", major_version: 1 }
//! ├── mimetype:   application/bincode
//! ├── metadata:   { network: "mainnet", has_activity: "true" }
//! ├── created:    RFC 3339 timestamp
//! └── data:       NetworkActivity (bincode)
//! ```
//!
//! Decoding rejects envelopes whose mimetype or event type does not match
//! the expected schema, so a subscriber can classify them as permanent
//! failures without touching storage.

mod activity;
mod count;
mod error;
mod event;
mod schema;

pub use activity::NetworkActivity;
pub use count::ActivityCount;
pub use error::ProtocolError;
pub use event::{Event, EventType, Mimetype, NETWORK_ACTIVITY_EVENT_TYPE, NETWORK_ACTIVITY_MIMETYPE};
pub use schema::{Activity, Network};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Calendar month layout used for bucket keys (`2023-08`)
pub const MONTH_LAYOUT: &str = "%Y-%m";

/// Calendar day layout used for day buckets (`2023-08-24`)
pub const DATE_LAYOUT: &str = "%Y-%m-%d";

// Test modules - only compiled during testing
#[cfg(test)]
mod activity_test;
#[cfg(test)]
mod error_test;
