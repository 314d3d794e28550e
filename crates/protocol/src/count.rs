//! Activity counters
//!
//! `ActivityCount` maps an activity kind to the number of times it occurred.
//! Counts only ever grow; additions saturate at `u64::MAX` instead of
//! wrapping.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::schema::Activity;

/// Occurrence counts keyed by activity kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityCount(BTreeMap<Activity, u64>);

impl ActivityCount {
    /// Create an empty count
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for an activity by one
    #[inline]
    pub fn incr(&mut self, activity: Activity) {
        self.add(activity, 1);
    }

    /// Add `n` to the count for an activity
    #[inline]
    pub fn add(&mut self, activity: Activity, n: u64) {
        let count = self.0.entry(activity).or_insert(0);
        *count = count.saturating_add(n);
    }

    /// Get the count for an activity (zero when absent)
    #[inline]
    pub fn get(&self, activity: Activity) -> u64 {
        self.0.get(&activity).copied().unwrap_or(0)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.0.values().fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    /// Add every count in `other` into this count
    pub fn merge(&mut self, other: &ActivityCount) {
        for (&activity, &n) in &other.0 {
            self.add(activity, n);
        }
    }

    /// Check if no activity has been counted
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct activity kinds present
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(activity, count)` pairs in activity order
    pub fn iter(&self) -> impl Iterator<Item = (Activity, u64)> + '_ {
        self.0.iter().map(|(a, n)| (*a, *n))
    }
}

impl FromIterator<(Activity, u64)> for ActivityCount {
    fn from_iter<I: IntoIterator<Item = (Activity, u64)>>(iter: I) -> Self {
        let mut count = Self::new();
        for (activity, n) in iter {
            count.add(activity, n);
        }
        count
    }
}

impl<'a> IntoIterator for &'a ActivityCount {
    type Item = (&'a Activity, &'a u64);
    type IntoIter = btree_map::Iter<'a, Activity, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
