//! Serve command - Run the activity pipeline
//!
//! Starts the publisher and subscriber over the in-process bus and runs until
//! Ctrl+C or SIGTERM, logging pipeline counters every `status_interval`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use netpulse_bus::MemoryBus;
use netpulse_config::Config;
use netpulse_pipeline::ActivityPipeline;

use super::open_store;

/// Run the serve command
pub async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "Netpulse starting"
    );

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("Netpulse shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let store = open_store(&config.store).await?;
    let bus = Arc::new(MemoryBus::new());

    let pipeline = ActivityPipeline::start(&config.activity, Arc::clone(&bus), store)
        .context("failed to start activity pipeline")?;

    info!(
        enabled = config.activity.enabled,
        store = ?config.store.backend,
        "activity pipeline ready"
    );

    let mut status = tokio::time::interval(config.global.status_interval);
    status.tick().await;

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = status.tick() => log_status(&pipeline),
        }
    }

    info!("shutdown signal received, stopping pipeline...");

    pipeline.shutdown(config.global.shutdown_timeout).await;
    bus.close();

    Ok(())
}

fn log_status(pipeline: &ActivityPipeline) {
    if let Some(publisher) = pipeline.publisher_metrics() {
        info!(
            occurrences_recorded = publisher.occurrences_recorded,
            occurrences_dropped = publisher.occurrences_dropped,
            windows_published = publisher.windows_published,
            publish_failures = publisher.publish_failures,
            "publisher status"
        );
    }

    if let Some(subscriber) = pipeline.subscriber_metrics() {
        info!(
            records_received = subscriber.records_received,
            records_acked = subscriber.records_acked,
            permanent_errors = subscriber.permanent_errors,
            transient_errors = subscriber.transient_errors,
            "subscriber status"
        );
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
