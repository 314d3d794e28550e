//! Netpulse - Activity Pipeline
//!
//! Counts directory activity in memory, publishes one aggregate per window to
//! the event bus, and merges consumed aggregates into month buckets.
//!
//! # Architecture
//!
//! ```text
//! [Handlers]                [Publisher]                 [Bus]          [Subscriber]         [Store]
//!  lookup ──┐                                                            decode
//!  search ──┼──→ Recorder ──→ mpsc ──→ Window ──tick──→ topic ──→ ack/nack ──→ retrieve/update ──→ MonthBucket
//!  register ┘     try_send             (one per network)
//! ```
//!
//! # Key Design
//!
//! - **Never blocks callers**: the recorder uses `try_send` and drops on a full queue
//! - **At-most-once windows**: a window that fails to publish is discarded
//! - **Explicit settlement**: every delivery is acked or nacked exactly once
//! - **Bounded store calls**: each store call has its own timeout
//!
//! # Example
//!
//! ```ignore
//! use netpulse_pipeline::ActivityPipeline;
//!
//! let pipeline = ActivityPipeline::start(&config.activity, bus, store)?;
//! let recorder = pipeline.recorder();
//!
//! recorder.lookup().organization(vasp_id).record();
//!
//! pipeline.shutdown(Duration::from_secs(10)).await;
//! ```

mod clock;
mod error;
mod metrics;
mod publisher;
mod recorder;
mod subscriber;
mod supervisor;
mod window;

pub use clock::{Clock, fixed_clock, system_clock};
pub use error::{PipelineError, Result};
pub use metrics::{PublisherMetrics, PublisherSnapshot, SubscriberMetrics, SubscriberSnapshot};
pub use publisher::{ActivityPublisher, PublisherConfig, PublisherMetricsHandle};
pub use recorder::{Entry, Occurrence, Recorder};
pub use subscriber::{ActivitySubscriber, SubscriberConfig, SubscriberMetricsHandle};
pub use supervisor::{ActivityPipeline, PipelineBuilder};
pub use window::WindowAggregator;

#[cfg(test)]
mod subscriber_test;
