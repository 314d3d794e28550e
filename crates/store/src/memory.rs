//! In-memory activity store

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::model::{MonthBucket, validate_month};
use crate::store::ActivityStore;

/// Month buckets held in a map, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    months: RwLock<BTreeMap<String, MonthBucket>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn retrieve_month(&self, month: &str) -> Result<MonthBucket> {
        validate_month(month)?;
        self.months
            .read()
            .get(month)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(month.to_string()))
    }

    async fn update_month(&self, bucket: &mut MonthBucket) -> Result<()> {
        let key = bucket.key()?.to_string();
        bucket.touch(Utc::now());
        self.months.write().insert(key, bucket.clone());
        Ok(())
    }

    async fn delete_month(&self, month: &str) -> Result<()> {
        validate_month(month)?;
        self.months.write().remove(month);
        Ok(())
    }

    async fn count_months(&self) -> Result<usize> {
        Ok(self.months.read().len())
    }
}
