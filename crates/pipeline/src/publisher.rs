//! Activity publisher
//!
//! Drains the recorder queue into the current window and, on every tick of
//! the aggregation interval, publishes the window to the event bus and starts
//! a new one. Each window is published at most once: a failed publish is
//! logged and the counts are discarded.
//!
//! # Example
//!
//! ```ignore
//! let (publisher, recorder) = ActivityPublisher::new(config, bus);
//! let cancel = CancellationToken::new();
//! tokio::spawn(publisher.run(cancel.clone()));
//!
//! recorder.lookup().organization("alice").record();
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use netpulse_bus::EventPublisher;
use netpulse_config::ActivityConfig;
use netpulse_protocol::Network;

use crate::clock::{Clock, system_clock};
use crate::error::{PipelineError, Result};
use crate::metrics::{PublisherMetrics, PublisherSnapshot};
use crate::recorder::{Occurrence, Recorder};
use crate::window::WindowAggregator;

/// Publisher settings
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Network stamped on every window
    pub network: Network,
    /// Topic windows are published to
    pub topic: String,
    /// Aggregation window length
    pub window: Duration,
    /// Recorder queue capacity
    pub queue_size: usize,
}

impl PublisherConfig {
    /// Build publisher settings from the activity section
    ///
    /// Fails on an unknown network or a zero aggregation window.
    pub fn from_activity(config: &ActivityConfig) -> Result<Self> {
        let network = config
            .network()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

        if config.aggregation_window.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "aggregation window must be greater than zero".into(),
            ));
        }

        Ok(Self {
            network,
            topic: config.topic.clone(),
            window: config.aggregation_window,
            queue_size: config.queue_size.max(1),
        })
    }
}

/// Handle for reading publisher metrics while the worker runs
#[derive(Debug, Clone)]
pub struct PublisherMetricsHandle {
    metrics: Arc<PublisherMetrics>,
}

impl PublisherMetricsHandle {
    pub fn snapshot(&self) -> PublisherSnapshot {
        self.metrics.snapshot()
    }
}

/// Background worker that aggregates and publishes windows
pub struct ActivityPublisher {
    config: PublisherConfig,
    bus: Arc<dyn EventPublisher>,
    rx: mpsc::Receiver<Occurrence>,
    metrics: Arc<PublisherMetrics>,
    clock: Clock,
}

impl ActivityPublisher {
    /// Create a publisher and the recorder that feeds it
    pub fn new(config: PublisherConfig, bus: Arc<dyn EventPublisher>) -> (Self, Recorder) {
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));
        let metrics = Arc::new(PublisherMetrics::new());
        let recorder = Recorder::new(tx, Arc::clone(&metrics));

        let publisher = Self {
            config,
            bus,
            rx,
            metrics,
            clock: system_clock(),
        };

        (publisher, recorder)
    }

    /// Replace the clock used to stamp window starts
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics_handle(&self) -> PublisherMetricsHandle {
        PublisherMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Spawn the worker on the current runtime
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until cancelled or every recorder is dropped
    ///
    /// The window open at exit is discarded, not flushed.
    pub async fn run(mut self, cancel: CancellationToken) {
        let period = self.config.window;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut window = WindowAggregator::new(self.config.network, period, (self.clock)());

        tracing::info!(
            topic = %self.config.topic,
            network = %self.config.network,
            window = ?period,
            "activity publisher started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!("activity publisher cancelled");
                    break;
                }

                _ = ticker.tick() => {
                    self.flush(&mut window).await;
                }

                occurrence = self.rx.recv() => {
                    match occurrence {
                        Some(occurrence) => window.record(&occurrence),
                        None => {
                            tracing::debug!("all recorders dropped");
                            break;
                        }
                    }
                }
            }
        }

        // Later recorder calls fail fast and count as drops
        self.rx.close();

        if window.occurrences() > 0 {
            tracing::debug!(
                discarded = window.occurrences(),
                "discarding partial activity window"
            );
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            occurrences_recorded = snapshot.occurrences_recorded,
            occurrences_dropped = snapshot.occurrences_dropped,
            windows_published = snapshot.windows_published,
            publish_failures = snapshot.publish_failures,
            encode_failures = snapshot.encode_failures,
            "activity publisher shutting down"
        );
    }

    /// Publish the current window and start the next one
    async fn flush(&self, window: &mut WindowAggregator) {
        let current = window.current();

        match current.encode() {
            Ok(payload) => match self.bus.publish(&self.config.topic, payload).await {
                Ok(()) => {
                    self.metrics.record_published();
                    tracing::debug!(
                        window_start = %current.window_start(),
                        occurrences = window.occurrences(),
                        "published activity window"
                    );
                }
                Err(e) => {
                    self.metrics.record_publish_failure();
                    tracing::warn!(
                        error = %e,
                        topic = %self.config.topic,
                        discarded = window.occurrences(),
                        "could not publish activity window"
                    );
                }
            },
            Err(e) => {
                self.metrics.record_encode_failure();
                tracing::warn!(error = %e, "could not encode activity window");
            }
        }

        window.reset((self.clock)());
    }
}
