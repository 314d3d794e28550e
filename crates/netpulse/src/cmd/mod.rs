//! Command implementations for the Netpulse CLI

pub mod activity;
pub mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};
use netpulse_config::{StoreBackend, StoreConfig};
use netpulse_store::{ActivityStore, DiskStore, MemoryStore};

/// Open the configured month bucket store
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn ActivityStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Disk => {
            let store = DiskStore::open(&config.path)
                .await
                .with_context(|| format!("failed to open activity store at {}", config.path))?;
            Ok(Arc::new(store))
        }
    }
}
