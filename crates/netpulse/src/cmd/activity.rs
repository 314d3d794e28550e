//! Activity command - Print the daily activity series
//!
//! # Usage
//!
//! ```bash
//! netpulse activity
//! netpulse activity --days 7
//! netpulse activity --now 2023-08-24T12:00:00Z
//! ```
//!
//! Reads month buckets from the configured store, so this is only useful
//! with the disk backend.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;

use netpulse_config::{Config, StoreBackend};
use netpulse_store::{DEFAULT_DAYS, network_activity};

use super::open_store;

/// Activity command arguments
#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Number of days to report, ending today
    #[arg(short, long, default_value_t = DEFAULT_DAYS)]
    pub days: u32,

    /// Report as of this date (YYYY-MM-DD) or RFC 3339 time instead of now
    #[arg(long)]
    pub now: Option<String>,
}

/// Run the activity command
pub async fn run(args: ActivityArgs, config: &Config) -> Result<()> {
    if config.store.backend == StoreBackend::Memory {
        tracing::warn!("memory store is empty at startup; configure the disk backend");
    }

    let now = match args.now.as_deref() {
        Some(s) => parse_now(s)?,
        None => Utc::now(),
    };

    let store = open_store(&config.store).await?;
    let report = network_activity(store.as_ref(), now, args.days)
        .await
        .context("failed to read network activity")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Parse a report date, either a calendar day or a full timestamp
fn parse_now(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD or RFC 3339"))?;
    let noon = date
        .and_hms_opt(12, 0, 0)
        .context("invalid time of day")?;
    Ok(noon.and_utc())
}
