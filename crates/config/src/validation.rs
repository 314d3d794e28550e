//! Configuration validation
//!
//! Validates config consistency:
//! - Enabled activity has a topic, a known network and non-zero sizes
//! - The disk store backend has a path
//! - Log target overrides name module paths
//! - The status interval is non-zero

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::logging::LogConfig;
use crate::store::StoreBackend;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_activity(config)?;
    validate_store(config)?;
    validate_log(config)?;
    validate_global(config)?;
    Ok(())
}

/// Validate the activity section
///
/// A disabled section is not checked; none of its values are used.
fn validate_activity(config: &Config) -> Result<()> {
    let activity = &config.activity;
    if !activity.enabled {
        return Ok(());
    }

    if activity.topic.trim().is_empty() {
        return Err(ConfigError::MissingTopic);
    }

    if let Err(e) = activity.network() {
        return Err(ConfigError::invalid_value("activity", "network", e.to_string()));
    }

    if activity.aggregation_window.is_zero() {
        return Err(ConfigError::invalid_value(
            "activity",
            "aggregation_window",
            "must be greater than zero",
        ));
    }

    if activity.queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "activity",
            "queue_size",
            "must be greater than zero",
        ));
    }

    if activity.store_timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "activity",
            "store_timeout",
            "must be greater than zero",
        ));
    }

    Ok(())
}

/// Validate the store section
fn validate_store(config: &Config) -> Result<()> {
    if config.store.backend == StoreBackend::Disk && config.store.path.trim().is_empty() {
        return Err(ConfigError::missing_field("store", "path"));
    }
    Ok(())
}

fn validate_log(config: &Config) -> Result<()> {
    if let Some(target) = config
        .log
        .targets
        .keys()
        .find(|target| !LogConfig::is_valid_target(target))
    {
        return Err(ConfigError::invalid_value(
            "log",
            "targets",
            format!("'{target}' is not a module path"),
        ));
    }
    Ok(())
}

fn validate_global(config: &Config) -> Result<()> {
    if config.global.status_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "global",
            "status_interval",
            "must be greater than zero",
        ));
    }
    Ok(())
}
