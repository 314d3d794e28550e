//! Daily activity time series
//!
//! Walks back a fixed number of calendar days from `now` and reports the
//! total events per day for testnet and mainnet. Days without a bucket are
//! zero; months without a bucket count as zero rather than failing.

use chrono::{DateTime, Days, Utc};
use netpulse_protocol::{DATE_LAYOUT, Network};
use serde::Serialize;

use crate::error::Result;
use crate::model::{MonthBucket, month_of};
use crate::store::ActivityStore;

/// Number of days reported by default
pub const DEFAULT_DAYS: u32 = 30;

/// Total events on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    /// Day in `YYYY-MM-DD` form
    pub date: String,
    /// Sum of all activity kinds on that day
    pub events: u64,
}

/// Per-network daily series, oldest day first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityReport {
    pub testnet: Vec<DailyActivity>,
    pub mainnet: Vec<DailyActivity>,
}

/// Build the daily series for the `days` calendar days ending on `now`
///
/// Each month touched by the range is read once. `NotFound` months are
/// treated as empty; any other store error is returned.
pub async fn network_activity(
    store: &dyn ActivityStore,
    now: DateTime<Utc>,
    days: u32,
) -> Result<ActivityReport> {
    let today = now.date_naive();
    let mut report = ActivityReport {
        testnet: Vec::with_capacity(days as usize),
        mainnet: Vec::with_capacity(days as usize),
    };

    let mut month: Option<MonthBucket> = None;
    for offset in (0..days).rev() {
        let Some(day) = today.checked_sub_days(Days::new(u64::from(offset))) else {
            continue;
        };

        let key = month_of(day);
        if month.as_ref().is_none_or(|m| m.date != key) {
            month = Some(match store.retrieve_month(&key).await {
                Ok(bucket) => bucket,
                Err(e) if e.is_not_found() => MonthBucket::new(key),
                Err(e) => return Err(e),
            });
        }

        let date = day.format(DATE_LAYOUT).to_string();
        let bucket = month.as_ref().and_then(|m| m.day(&date));
        let events = |network| bucket.map_or(0, |b| b.activity.total(network));

        report.testnet.push(DailyActivity {
            date: date.clone(),
            events: events(Network::TestNet),
        });
        report.mainnet.push(DailyActivity {
            date,
            events: events(Network::MainNet),
        });
    }

    Ok(report)
}
