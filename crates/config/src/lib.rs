//! Netpulse Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use netpulse_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[activity]\nenabled = true\ntopic = \"activity\"").unwrap();
//! assert!(config.activity.enabled);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [global]
//! shutdown_timeout = "10s"
//!
//! [log]
//! level = "info"
//!
//! [log.targets]
//! netpulse_pipeline = "debug"
//!
//! [activity]
//! enabled = true
//! topic = "network-activity"
//! network = "mainnet"
//! aggregation_window = "5m"
//!
//! [store]
//! backend = "disk"
//! path = "data/activity"
//! ```

mod activity;
mod error;
mod global;
mod logging;
mod store;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use activity::ActivityConfig;
pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shutdown timeout and status log interval
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Activity aggregation and publishing
    pub activity: ActivityConfig,

    /// Month bucket storage
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert!(!config.activity.enabled);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.global.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.log.output, LogOutput::Stderr);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[global]
shutdown_timeout = "3s"

[log]
level = "debug"
format = "json"

[log.targets]
netpulse_bus = "warn"

[activity]
enabled = true
topic = "network-activity"
network = "mainnet"
aggregation_window = "10m"

[store]
backend = "disk"
path = "/var/lib/netpulse"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.global.shutdown_timeout, Duration::from_secs(3));
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.directives("debug"), "debug,netpulse_bus=warn");
        assert_eq!(config.activity.topic, "network-activity");
        assert_eq!(config.activity.aggregation_window, Duration::from_secs(600));
        assert_eq!(config.store.backend, StoreBackend::Disk);
        assert_eq!(config.store.path, "/var/lib/netpulse");
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[activity]\nenabled = true\ntopic = \"t\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.activity.topic, "t");
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/netpulse.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("/nonexistent/netpulse.toml"));
    }
}
