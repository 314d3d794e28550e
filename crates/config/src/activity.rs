//! Activity pipeline configuration
//!
//! Controls whether occurrences are aggregated and published, which topic
//! windows go to, and how the subscriber talks to the store.
//!
//! # Defaults
//!
//! Publishing is disabled by default. When enabled, a topic is required.

use netpulse_protocol::{Network, ProtocolError};
use serde::Deserialize;
use std::time::Duration;

/// Activity configuration
///
/// # Example
///
/// ```toml
/// [activity]
/// enabled = true
/// topic = "network-activity"
/// network = "mainnet"
/// aggregation_window = "10m"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Aggregate and publish network activity
    /// Default: false
    pub enabled: bool,

    /// Event bus topic windows are published to and consumed from
    pub topic: String,

    /// Network this process records activity for (testnet, mainnet, rvasp)
    /// Default: testnet
    pub network: String,

    /// Length of each aggregation window
    /// Default: 5m
    #[serde(with = "humantime_serde")]
    pub aggregation_window: Duration,

    /// Capacity of the recorder queue; occurrences beyond it are dropped
    /// Default: 1000
    pub queue_size: usize,

    /// Upper bound on every store call made by the subscriber
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,

    /// Run the subscriber that merges windows into the store
    /// Default: true
    pub subscribe: bool,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            topic: String::new(),
            network: Network::TestNet.to_string(),
            aggregation_window: Duration::from_secs(5 * 60),
            queue_size: 1000,
            store_timeout: Duration::from_secs(10),
            subscribe: true,
        }
    }
}

impl ActivityConfig {
    /// Parse the configured network name
    pub fn network(&self) -> Result<Network, ProtocolError> {
        self.network.parse()
    }
}
