//! Netpulse Store - Calendar-bucketed activity storage
//!
//! Aggregated network activity is stored as one `MonthBucket` per calendar
//! month, each holding sorted `DayBucket`s with per-network and
//! per-organization counts.
//!
//! # Components
//!
//! - `model` - `MonthBucket`, `DayBucket`, `NetworkCounts` and pure merge ops
//! - `ActivityStore` - async whole-bucket read / replace interface
//! - `MemoryStore` / `DiskStore` - the two backends
//! - `network_activity` - daily time series for the last N days
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::new();
//! let mut month = ensure_month(&update.month())?;
//! month.add(&update);
//! store.update_month(&mut month).await?;
//!
//! let report = network_activity(&store, Utc::now(), DEFAULT_DAYS).await?;
//! ```

mod disk;
mod error;
mod memory;
mod model;
mod store;
mod timeseries;

pub use disk::DiskStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use model::{
    DayBucket, MonthBucket, NetworkCounts, day_index, ensure_month, merge_counts, month_of,
    validate_month,
};
pub use store::ActivityStore;
pub use timeseries::{ActivityReport, DEFAULT_DAYS, DailyActivity, network_activity};
