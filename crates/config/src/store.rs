//! Store configuration

use serde::Deserialize;

/// Storage backend for month buckets
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map, lost on restart (default)
    #[default]
    Memory,
    /// One JSON document per month under `path`
    Disk,
}

/// Store configuration
///
/// # Example
///
/// ```toml
/// [store]
/// backend = "disk"
/// path = "/var/lib/netpulse/activity"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend (memory, disk)
    /// Default: memory
    pub backend: StoreBackend,

    /// Directory for the disk backend
    /// Default: "data/activity"
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: "data/activity".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.path, "data/activity");
    }

    #[test]
    fn test_deserialize_disk() {
        let toml = r#"
backend = "disk"
path = "/tmp/activity"
"#;
        let config: StoreConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.backend, StoreBackend::Disk);
        assert_eq!(config.path, "/tmp/activity");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(toml::from_str::<StoreConfig>("backend = \"redis\"").is_err());
    }
}
