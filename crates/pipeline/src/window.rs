//! Window aggregator
//!
//! Holds the single live `NetworkActivity` the publisher folds occurrences
//! into. Only the publisher worker touches it, so there is no locking.

use std::time::Duration;

use chrono::{DateTime, Utc};

use netpulse_protocol::{Network, NetworkActivity};

use crate::recorder::Occurrence;

/// Counts for the current aggregation window
#[derive(Debug)]
pub struct WindowAggregator {
    current: NetworkActivity,
    occurrences: u64,
}

impl WindowAggregator {
    /// Create an empty window starting at `start`
    pub fn new(network: Network, window: Duration, start: DateTime<Utc>) -> Self {
        Self {
            current: NetworkActivity::new(network, window, start),
            occurrences: 0,
        }
    }

    /// Fold one occurrence into the window
    pub fn record(&mut self, occurrence: &Occurrence) {
        match &occurrence.organization {
            Some(organization) => self
                .current
                .incr_organization(organization, occurrence.activity),
            None => self.current.incr(occurrence.activity),
        }
        self.occurrences += 1;
    }

    /// The window as it would be published now
    #[inline]
    pub fn current(&self) -> &NetworkActivity {
        &self.current
    }

    /// Occurrences folded in since the last reset
    #[inline]
    pub fn occurrences(&self) -> u64 {
        self.occurrences
    }

    /// Discard all counts and start the next window
    ///
    /// The next start is `max(now, current start)`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.current.reset(now);
        self.occurrences = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netpulse_protocol::Activity;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_record_counts_every_occurrence() {
        let mut window = WindowAggregator::new(
            Network::MainNet,
            Duration::from_secs(300),
            ts("2023-08-24T12:00:00Z"),
        );

        window.record(&Occurrence::new(Activity::Lookup).with_organization("alice"));
        window.record(&Occurrence::new(Activity::Lookup));
        for _ in 0..3 {
            window.record(&Occurrence::new(Activity::Search).with_organization("bob"));
        }

        let current = window.current();
        assert_eq!(window.occurrences(), 5);
        assert_eq!(current.activity.get(Activity::Lookup), 2);
        assert_eq!(current.activity.get(Activity::Search), 3);
        assert_eq!(current.organizations["alice"].get(Activity::Lookup), 1);
        assert_eq!(current.organizations["bob"].get(Activity::Search), 3);
        assert_eq!(current.organizations.len(), 2);
    }

    #[test]
    fn test_reset_starts_fresh_window() {
        let start = ts("2023-08-24T12:00:00Z");
        let mut window = WindowAggregator::new(Network::TestNet, Duration::from_secs(300), start);
        window.record(&Occurrence::new(Activity::Register));

        window.reset(ts("2023-08-24T12:05:00Z"));
        assert!(window.current().is_empty());
        assert_eq!(window.occurrences(), 0);
        assert_eq!(window.current().window_start(), ts("2023-08-24T12:05:00Z"));

        // Clock went backwards; start is kept
        window.reset(ts("2023-08-24T11:00:00Z"));
        assert_eq!(window.current().window_start(), ts("2023-08-24T12:05:00Z"));
    }
}
