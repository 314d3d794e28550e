//! On-disk activity store
//!
//! One pretty-printed JSON document per month, named `<YYYY-MM>.json`, under
//! a single directory. Writes go to `<YYYY-MM>.json.tmp` and are renamed over
//! the target, so a failed write never leaves a partial bucket behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::model::{MonthBucket, validate_month};
use crate::store::ActivityStore;

const EXTENSION: &str = "json";

/// Month buckets stored as JSON files in a directory
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Directory the buckets live in
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn month_path(&self, month: &str) -> PathBuf {
        self.root.join(format!("{month}.{EXTENSION}"))
    }
}

#[async_trait]
impl ActivityStore for DiskStore {
    async fn retrieve_month(&self, month: &str) -> Result<MonthBucket> {
        validate_month(month)?;
        let path = self.month_path(month);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(month.to_string()));
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        Ok(serde_json::from_slice(&data)?)
    }

    async fn update_month(&self, bucket: &mut MonthBucket) -> Result<()> {
        let path = self.month_path(bucket.key()?);

        let mut stamped = bucket.clone();
        stamped.touch(Utc::now());
        let data = serde_json::to_vec_pretty(&stamped)?;

        // Write to temp file first
        let temp_path = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&temp_path, &data)
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;

        // Atomic rename
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(&path, e));
        }

        debug!(month = %stamped.date, days = stamped.days.len(), "activity month written");
        *bucket = stamped;
        Ok(())
    }

    async fn delete_month(&self, month: &str) -> Result<()> {
        validate_month(month)?;
        let path = self.month_path(month);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn count_months(&self) -> Result<usize> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && validate_month(stem).is_ok()
            {
                count += 1;
            }
        }
        Ok(count)
    }
}
