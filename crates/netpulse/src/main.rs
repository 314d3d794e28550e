//! Netpulse - Network activity aggregation
//!
//! # Usage
//!
//! ```bash
//! # Run the pipeline (default)
//! netpulse
//! netpulse --config configs/config.toml
//!
//! # Print the 30-day activity series from the store
//! netpulse activity
//! netpulse activity --days 7 --now 2023-08-24
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netpulse_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Netpulse - Network activity aggregation
#[derive(Parser, Debug)]
#[command(name = "netpulse")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the activity pipeline until interrupted
    Serve,

    /// Print daily activity per network as JSON
    Activity(cmd::activity::ActivityArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Activity(args)) => {
            // Output goes to stdout; only warnings are logged
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), &config.log)?;
            cmd::activity::run(args, &config).await
        }
        Some(Command::Serve) | None => {
            let level = cli
                .log_level
                .as_deref()
                .unwrap_or_else(|| config.log.level.as_str());
            init_logging(level, &config.log)?;
            cmd::serve::run(config).await
        }
    }
}

/// Load configuration: explicit path > default paths > defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    let default_paths = [
        PathBuf::from("configs/config.toml"),
        PathBuf::from("config.toml"),
    ];
    for path in &default_paths {
        if path.exists() {
            return Config::from_file(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()));
        }
    }

    Ok(Config::default())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let directives = log.directives(level);
    let filter = EnvFilter::try_new(&directives)
        .or_else(|_| EnvFilter::try_new(log.directives("info")))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stdout) => fmt::layer().with_target(true).boxed(),
        (LogFormat::Console, LogOutput::Stderr) => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        (LogFormat::Json, LogOutput::Stdout) => fmt::layer().json().boxed(),
        (LogFormat::Json, LogOutput::Stderr) => {
            fmt::layer().json().with_writer(std::io::stderr).boxed()
        }
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    info!(filter = %directives, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["netpulse"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_activity_args() {
        let cli = Cli::try_parse_from([
            "netpulse",
            "activity",
            "--days",
            "7",
            "--now",
            "2023-08-24",
            "--config",
            "netpulse.toml",
        ])
        .unwrap();

        let Some(Command::Activity(args)) = cli.command else {
            panic!("expected activity command");
        };
        assert_eq!(args.days, 7);
        assert_eq!(args.now.as_deref(), Some("2023-08-24"));
        assert_eq!(cli.config, Some(PathBuf::from("netpulse.toml")));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/netpulse.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[activity]\nenabled = true\ntopic = \"activity\"").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert!(config.activity.enabled);
        assert_eq!(config.activity.topic, "activity");
    }
}
