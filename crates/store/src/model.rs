//! Calendar bucket model
//!
//! Month is the storage granularity and day the query granularity. A
//! `MonthBucket` owns a chronologically sorted list of `DayBucket`s, unique by
//! date. Every operation here is pure; stores persist whole month buckets.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use netpulse_protocol::{ActivityCount, MONTH_LAYOUT, Network, NetworkActivity};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Activity counts broken down by network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkCounts(BTreeMap<Network, ActivityCount>);

impl NetworkCounts {
    /// Create empty counts
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for one network, if any were recorded
    #[inline]
    pub fn get(&self, network: Network) -> Option<&ActivityCount> {
        self.0.get(&network)
    }

    /// Sum of every activity kind on one network
    pub fn total(&self, network: Network) -> u64 {
        self.get(network).map_or(0, ActivityCount::total)
    }

    /// Add counts to one network
    pub fn add(&mut self, network: Network, counts: &ActivityCount) {
        merge_counts(self.0.entry(network).or_default(), counts);
    }

    /// Check if no network has counts
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over networks in order
    pub fn iter(&self) -> impl Iterator<Item = (Network, &ActivityCount)> + '_ {
        self.0.iter().map(|(n, c)| (*n, c))
    }
}

/// Activity for a single calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    /// Day in `YYYY-MM-DD` form
    pub date: String,

    /// Per-network activity
    #[serde(default)]
    pub activity: NetworkCounts,

    /// Per-organization, per-network activity
    #[serde(default)]
    pub organizations: BTreeMap<String, NetworkCounts>,
}

impl DayBucket {
    /// Create an empty bucket for a date
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            activity: NetworkCounts::new(),
            organizations: BTreeMap::new(),
        }
    }

    /// Add one window's counts to this day
    pub fn merge(&mut self, update: &NetworkActivity) {
        self.activity.add(update.network, &update.activity);
        for (organization, counts) in &update.organizations {
            self.organizations
                .entry(organization.clone())
                .or_default()
                .add(update.network, counts);
        }
    }
}

/// Activity for a single calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// Month in `YYYY-MM` form, also the storage key
    pub date: String,

    /// Days with activity, sorted by date
    #[serde(default)]
    pub days: Vec<DayBucket>,

    /// First time the bucket was stored
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Last time the bucket was stored
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl MonthBucket {
    /// Create an empty bucket without validating the month
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            days: Vec::new(),
            created: None,
            modified: None,
        }
    }

    /// Storage key for this bucket
    pub fn key(&self) -> Result<&str> {
        if self.date.is_empty() {
            return Err(StoreError::IncompleteRecord("activity month has no date"));
        }
        validate_month(&self.date)?;
        Ok(&self.date)
    }

    /// Position of the day bucket for `date`
    #[inline]
    pub fn day_index(&self, date: &str) -> Option<usize> {
        day_index(self, date)
    }

    /// Day bucket for `date`, if present
    pub fn day(&self, date: &str) -> Option<&DayBucket> {
        self.day_index(date).map(|i| &self.days[i])
    }

    /// Find or insert the day bucket for `date`, keeping days sorted
    pub fn day_mut(&mut self, date: &str) -> &mut DayBucket {
        let idx = match self
            .days
            .binary_search_by(|day| day.date.as_str().cmp(date))
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.days.insert(idx, DayBucket::new(date));
                idx
            }
        };
        &mut self.days[idx]
    }

    /// Merge one window into the day its window end falls on
    pub fn add(&mut self, update: &NetworkActivity) {
        let date = update.date();
        self.day_mut(&date).merge(update);
    }

    /// Stamp modification time, and creation time on first write
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.modified = Some(now);
        if self.created.is_none() {
            self.created = Some(now);
        }
    }
}

/// Position of the day bucket for `date` in a month bucket
///
/// Relies on the days being sorted, which `day_mut` maintains.
pub fn day_index(bucket: &MonthBucket, date: &str) -> Option<usize> {
    bucket
        .days
        .binary_search_by(|day| day.date.as_str().cmp(date))
        .ok()
}

/// Element-wise saturating addition of `src` into `dst`
#[inline]
pub fn merge_counts(dst: &mut ActivityCount, src: &ActivityCount) {
    dst.merge(src);
}

/// Construct an empty, well-formed bucket for a `YYYY-MM` month
pub fn ensure_month(month: &str) -> Result<MonthBucket> {
    validate_month(month)?;
    Ok(MonthBucket::new(month))
}

/// Check that a month key is `YYYY-MM` with a month in 01-12
pub fn validate_month(month: &str) -> Result<()> {
    let bytes = month.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return Err(StoreError::invalid_key(month, "expected YYYY-MM"));
    }
    if !bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || b.is_ascii_digit())
    {
        return Err(StoreError::invalid_key(month, "expected YYYY-MM"));
    }

    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| StoreError::invalid_key(month, "month out of range"))?;
    Ok(())
}

/// Month key (`YYYY-MM`) of a calendar day
pub fn month_of(date: NaiveDate) -> String {
    date.format(MONTH_LAYOUT).to_string()
}
