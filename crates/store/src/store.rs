//! Activity store trait for abstracting storage backends
//!
//! The subscriber and the time-series query only need whole-bucket reads and
//! writes keyed by month:
//! - `MemoryStore` - in-process map, used by tests and as the default
//! - `DiskStore` - one JSON document per month

use async_trait::async_trait;

use crate::error::Result;
use crate::model::MonthBucket;

/// Abstract month bucket storage
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Get the bucket for a `YYYY-MM` month
    ///
    /// Returns `StoreError::NotFound` when no bucket has been stored yet.
    async fn retrieve_month(&self, month: &str) -> Result<MonthBucket>;

    /// Create or replace the bucket for its month
    ///
    /// Stamps `modified` (and `created` on first write) before storing.
    async fn update_month(&self, bucket: &mut MonthBucket) -> Result<()>;

    /// Remove the bucket for a month; absent months are not an error
    async fn delete_month(&self, month: &str) -> Result<()>;

    /// Number of stored month buckets
    async fn count_months(&self) -> Result<usize>;
}
