//! Process-wide settings for `netpulse serve`

use serde::Deserialize;
use std::time::Duration;

/// `[global]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// How long shutdown waits for each pipeline worker
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// How often publisher and subscriber counters are logged
    #[serde(with = "humantime_serde")]
    pub status_interval: Duration,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(10),
            status_interval: Duration::from_secs(60),
        }
    }
}
