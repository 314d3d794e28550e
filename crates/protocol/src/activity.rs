//! Network activity aggregation window
//!
//! A `NetworkActivity` sums every occurrence recorded on one network during
//! one aggregation window. It is published as the payload of an `Event` and
//! merged by the subscriber into calendar buckets.
//!
//! Invariant: for every activity kind, the sum of the per-organization counts
//! never exceeds the top-level count. `incr_organization` keeps this true by
//! incrementing both in the same call.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::count::ActivityCount;
use crate::error::ProtocolError;
use crate::event::{Event, NETWORK_ACTIVITY_EVENT_TYPE, NETWORK_ACTIVITY_MIMETYPE};
use crate::schema::{Activity, Network};
use crate::{Bytes, DATE_LAYOUT, MONTH_LAYOUT, Result};

/// Time-aggregated activity for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkActivity {
    /// Network the activity was observed on
    pub network: Network,

    /// Count of all activity by kind
    pub activity: ActivityCount,

    /// Per-organization activity, a subset of `activity`
    pub organizations: BTreeMap<String, ActivityCount>,

    /// Start of the aggregation window
    pub timestamp: DateTime<Utc>,

    /// Length of the aggregation window
    pub window: Duration,
}

impl NetworkActivity {
    /// Create an empty aggregation window starting at `start`
    pub fn new(network: Network, window: Duration, start: DateTime<Utc>) -> Self {
        Self {
            network,
            activity: ActivityCount::new(),
            organizations: BTreeMap::new(),
            timestamp: start,
            window,
        }
    }

    /// Count one occurrence of an activity
    #[inline]
    pub fn incr(&mut self, activity: Activity) {
        self.activity.incr(activity);
    }

    /// Count one occurrence of an activity attributed to an organization
    ///
    /// Also increments the top-level count.
    pub fn incr_organization(&mut self, organization: &str, activity: Activity) {
        match self.organizations.get_mut(organization) {
            Some(count) => count.incr(activity),
            None => {
                let mut count = ActivityCount::new();
                count.incr(activity);
                self.organizations.insert(organization.to_string(), count);
            }
        }
        self.activity.incr(activity);
    }

    /// Clear all counts and start a new window
    ///
    /// The new start never moves backwards: if `start` is earlier than the
    /// current window start, the current start is kept.
    pub fn reset(&mut self, start: DateTime<Utc>) {
        self.activity = ActivityCount::new();
        self.organizations.clear();
        self.timestamp = start.max(self.timestamp);
    }

    /// Check if nothing was counted in this window
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.activity.is_empty()
    }

    /// Start of the aggregation window
    #[inline]
    pub fn window_start(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// End of the aggregation window (start + window)
    pub fn window_end(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.window)
            .ok()
            .and_then(|delta| self.timestamp.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Calendar day (`YYYY-MM-DD`) this window is bucketed into
    pub fn date(&self) -> String {
        self.window_end().format(DATE_LAYOUT).to_string()
    }

    /// Calendar month (`YYYY-MM`) this window is bucketed into
    pub fn month(&self) -> String {
        self.window_end().format(MONTH_LAYOUT).to_string()
    }

    /// Wrap this window in a versioned event envelope
    pub fn to_event(&self) -> Result<Event> {
        let data = bincode::serialize(self).map_err(ProtocolError::encode)?;

        let mut event = Event::new(NETWORK_ACTIVITY_EVENT_TYPE, NETWORK_ACTIVITY_MIMETYPE, data);
        event
            .metadata
            .insert("network".to_string(), self.network.to_string());
        if !self.is_empty() {
            event
                .metadata
                .insert("has_activity".to_string(), "true".to_string());
        }

        Ok(event)
    }

    /// Extract a window from an event envelope
    ///
    /// Fails if the envelope's mimetype or event type does not match.
    pub fn from_event(event: &Event) -> Result<Self> {
        if event.mimetype != NETWORK_ACTIVITY_MIMETYPE {
            return Err(ProtocolError::UnhandledMimetype {
                expected: NETWORK_ACTIVITY_MIMETYPE.as_str(),
                actual: event.mimetype.as_str(),
            });
        }

        if !event.event_type.matches(&NETWORK_ACTIVITY_EVENT_TYPE) {
            return Err(ProtocolError::UnhandledEventType {
                name: event.event_type.name.to_string(),
                major_version: event.event_type.major_version,
            });
        }

        bincode::deserialize(&event.data).map_err(ProtocolError::decode)
    }

    /// Encode this window as wire bytes (envelope included)
    pub fn encode(&self) -> Result<Bytes> {
        self.to_event()?.encode()
    }

    /// Decode a window from wire bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let event = Event::decode(bytes)?;
        Self::from_event(&event)
    }
}
