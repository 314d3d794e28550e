//! Hot-path activity recorder
//!
//! Request handlers record occurrences through a `Recorder`. Recording never
//! blocks: occurrences go onto a bounded queue with `try_send`, and when the
//! queue is full (or the publisher has stopped) the occurrence is dropped and
//! counted.
//!
//! ```ignore
//! recorder.lookup().organization(vasp_id).record();
//! recorder.search().record();
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use netpulse_protocol::Activity;

use crate::metrics::PublisherMetrics;

/// A single recorded use of the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// What happened
    pub activity: Activity,
    /// Organization that caused it, if known
    pub organization: Option<String>,
    /// When it was recorded
    pub timestamp: DateTime<Utc>,
}

impl Occurrence {
    /// Create an occurrence stamped with the current time
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            organization: None,
            timestamp: Utc::now(),
        }
    }

    /// Attribute the occurrence to an organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// Handle for recording occurrences
///
/// This is cheap to clone and can be passed to every request handler.
/// A disabled recorder accepts calls and does nothing.
#[derive(Debug, Clone)]
pub struct Recorder {
    queue: Option<Queue>,
}

#[derive(Debug, Clone)]
struct Queue {
    tx: mpsc::Sender<Occurrence>,
    metrics: Arc<PublisherMetrics>,
}

impl Recorder {
    pub(crate) fn new(tx: mpsc::Sender<Occurrence>, metrics: Arc<PublisherMetrics>) -> Self {
        Self {
            queue: Some(Queue { tx, metrics }),
        }
    }

    /// Create a recorder that discards everything
    pub fn disabled() -> Self {
        Self { queue: None }
    }

    /// Check if occurrences are forwarded to a publisher
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    /// Start a lookup entry
    pub fn lookup(&self) -> Entry<'_> {
        Entry::new(self, Activity::Lookup)
    }

    /// Start a search entry
    pub fn search(&self) -> Entry<'_> {
        Entry::new(self, Activity::Search)
    }

    /// Start a registration entry
    pub fn register(&self) -> Entry<'_> {
        Entry::new(self, Activity::Register)
    }

    /// Record one occurrence, dropping it if the queue is full
    pub fn record(&self, activity: Activity, organization: Option<&str>) {
        let mut occurrence = Occurrence::new(activity);
        occurrence.organization = organization.map(str::to_string);
        self.enqueue(occurrence);
    }

    /// Try to queue an occurrence without waiting
    ///
    /// Returns false if it was dropped (queue full or closed) or the recorder
    /// is disabled. Callers should not retry.
    pub fn enqueue(&self, occurrence: Occurrence) -> bool {
        let Some(queue) = &self.queue else {
            return false;
        };

        match queue.tx.try_send(occurrence) {
            Ok(()) => {
                queue.metrics.record_occurrence();
                true
            }
            Err(_) => {
                queue.metrics.record_dropped();
                false
            }
        }
    }
}

/// Pending occurrence built with `Recorder::lookup()` and friends
///
/// Nothing is recorded until `record()` is called.
#[must_use = "call record() to commit the entry"]
#[derive(Debug)]
pub struct Entry<'a> {
    recorder: &'a Recorder,
    occurrence: Occurrence,
}

impl<'a> Entry<'a> {
    fn new(recorder: &'a Recorder, activity: Activity) -> Self {
        Self {
            recorder,
            occurrence: Occurrence::new(activity),
        }
    }

    /// Attribute the entry to an organization
    pub fn organization(mut self, id: impl Into<String>) -> Self {
        self.occurrence.organization = Some(id.into());
        self
    }

    /// Commit the entry
    pub fn record(self) {
        self.recorder.enqueue(self.occurrence);
    }
}
