//! Logging configuration
//!
//! `level` applies to every target; `targets` overrides it per crate or
//! module path. Logs go to stderr by default so `netpulse activity` can
//! write its JSON report to stdout.
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "json"
//!
//! [log.targets]
//! netpulse_pipeline = "debug"
//! netpulse_bus = "warn"
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every record the subscriber touches
    Trace,
    /// Per-window and per-month detail
    Debug,
    #[default]
    Info,
    /// Publish failures and dropped occurrences
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// Log destination
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
}

/// `[log]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for targets without an override
    pub level: LogLevel,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Level overrides keyed by target, e.g. `netpulse_pipeline`
    pub targets: BTreeMap<String, LogLevel>,
}

impl LogConfig {
    /// Build filter directives: `base` first, then each target override
    ///
    /// `base` is normally `level`, or the level given on the command line.
    pub fn directives(&self, base: &str) -> String {
        self.targets
            .iter()
            .fold(base.to_string(), |mut out, (target, level)| {
                out.push(',');
                out.push_str(target);
                out.push('=');
                out.push_str(level.as_str());
                out
            })
    }

    /// Check that a target override names a module path
    pub(crate) fn is_valid_target(target: &str) -> bool {
        target.split("::").all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
    }
}
