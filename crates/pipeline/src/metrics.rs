//! Activity pipeline metrics
//!
//! Atomic counters for the publisher and subscriber workers.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the activity publisher and its recorders
///
/// Shared between every `Recorder` clone and the publisher worker.
#[derive(Debug, Default)]
pub struct PublisherMetrics {
    /// Occurrences accepted into the queue
    occurrences_recorded: AtomicU64,

    /// Occurrences dropped because the queue was full or closed
    occurrences_dropped: AtomicU64,

    /// Windows published to the bus
    windows_published: AtomicU64,

    /// Windows lost because the bus rejected them
    publish_failures: AtomicU64,

    /// Windows lost because they could not be encoded
    encode_failures: AtomicU64,
}

impl PublisherMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            occurrences_recorded: AtomicU64::new(0),
            occurrences_dropped: AtomicU64::new(0),
            windows_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_occurrence(&self) {
        self.occurrences_recorded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.occurrences_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_published(&self) {
        self.windows_published.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> PublisherSnapshot {
        PublisherSnapshot {
            occurrences_recorded: self.occurrences_recorded.load(Ordering::Relaxed),
            occurrences_dropped: self.occurrences_dropped.load(Ordering::Relaxed),
            windows_published: self.windows_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of publisher metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublisherSnapshot {
    pub occurrences_recorded: u64,
    pub occurrences_dropped: u64,
    pub windows_published: u64,
    pub publish_failures: u64,
    pub encode_failures: u64,
}

/// Metrics for the activity subscriber
#[derive(Debug, Default)]
pub struct SubscriberMetrics {
    /// Records taken off the subscription
    records_received: AtomicU64,

    /// Records merged and acknowledged
    records_acked: AtomicU64,

    /// Records nacked as undecodable
    permanent_errors: AtomicU64,

    /// Records nacked because the store failed
    transient_errors: AtomicU64,
}

impl SubscriberMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            records_received: AtomicU64::new(0),
            records_acked: AtomicU64::new(0),
            permanent_errors: AtomicU64::new(0),
            transient_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_acked(&self) {
        self.records_acked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_permanent_error(&self) {
        self.permanent_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_transient_error(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> SubscriberSnapshot {
        SubscriberSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_acked: self.records_acked.load(Ordering::Relaxed),
            permanent_errors: self.permanent_errors.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of subscriber metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriberSnapshot {
    pub records_received: u64,
    pub records_acked: u64,
    pub permanent_errors: u64,
    pub transient_errors: u64,
}

impl SubscriberSnapshot {
    /// Records received but not yet settled
    #[inline]
    pub fn in_flight(&self) -> u64 {
        let settled = self
            .records_acked
            .saturating_add(self.permanent_errors)
            .saturating_add(self.transient_errors);
        self.records_received.saturating_sub(settled)
    }
}
