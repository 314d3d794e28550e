//! Pipeline supervisor
//!
//! Starts the publisher and subscriber for the configured network and stops
//! them together. With activity disabled nothing is spawned and the recorder
//! discards everything.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use netpulse_bus::{EventPublisher, EventSubscriber};
use netpulse_config::ActivityConfig;
use netpulse_store::ActivityStore;

use crate::clock::{Clock, system_clock};
use crate::error::{PipelineError, Result};
use crate::metrics::{PublisherSnapshot, SubscriberSnapshot};
use crate::publisher::{ActivityPublisher, PublisherConfig, PublisherMetricsHandle};
use crate::recorder::Recorder;
use crate::subscriber::{ActivitySubscriber, SubscriberConfig, SubscriberMetricsHandle};

/// Builder for an `ActivityPipeline`
pub struct PipelineBuilder {
    config: ActivityConfig,
    clock: Clock,
}

impl PipelineBuilder {
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            config,
            clock: system_clock(),
        }
    }

    /// Clock used to stamp window starts
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Spawn the workers on the current runtime
    pub fn start<B>(self, bus: Arc<B>, store: Arc<dyn ActivityStore>) -> Result<ActivityPipeline>
    where
        B: EventPublisher + EventSubscriber + 'static,
    {
        let cancel = CancellationToken::new();

        if !self.config.enabled {
            tracing::info!("network activity disabled");
            return Ok(ActivityPipeline {
                recorder: Recorder::disabled(),
                cancel,
                publisher: None,
                subscriber: None,
            });
        }

        if self.config.topic.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "topic is required when activity is enabled".into(),
            ));
        }

        let publisher_config = PublisherConfig::from_activity(&self.config)?;
        let network = publisher_config.network;

        let publisher_bus: Arc<dyn EventPublisher> = bus.clone();
        let (publisher, recorder) = ActivityPublisher::new(publisher_config, publisher_bus);
        let publisher = publisher.with_clock(self.clock);
        let publisher_metrics = publisher.metrics_handle();
        let publisher_task = publisher.spawn(cancel.child_token());

        let subscriber = if self.config.subscribe {
            let subscriber_bus: Arc<dyn EventSubscriber> = bus;
            let subscriber = ActivitySubscriber::new(
                SubscriberConfig::from_activity(&self.config),
                subscriber_bus,
                store,
            );
            let metrics = subscriber.metrics_handle();
            Some((subscriber.spawn(cancel.child_token()), metrics))
        } else {
            None
        };

        tracing::info!(
            network = %network,
            topic = %self.config.topic,
            subscribe = self.config.subscribe,
            "network activity pipeline started"
        );

        Ok(ActivityPipeline {
            recorder,
            cancel,
            publisher: Some((publisher_task, publisher_metrics)),
            subscriber,
        })
    }
}

/// Running publisher and subscriber workers
pub struct ActivityPipeline {
    recorder: Recorder,
    cancel: CancellationToken,
    publisher: Option<(JoinHandle<()>, PublisherMetricsHandle)>,
    subscriber: Option<(JoinHandle<Result<()>>, SubscriberMetricsHandle)>,
}

impl ActivityPipeline {
    /// Start the pipeline with the system clock
    pub fn start<B>(
        config: &ActivityConfig,
        bus: Arc<B>,
        store: Arc<dyn ActivityStore>,
    ) -> Result<Self>
    where
        B: EventPublisher + EventSubscriber + 'static,
    {
        PipelineBuilder::new(config.clone()).start(bus, store)
    }

    /// Recorder handed to request handlers
    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    /// Check if any worker is running
    pub fn is_running(&self) -> bool {
        self.publisher.is_some()
    }

    pub fn publisher_metrics(&self) -> Option<PublisherSnapshot> {
        self.publisher.as_ref().map(|(_, metrics)| metrics.snapshot())
    }

    pub fn subscriber_metrics(&self) -> Option<SubscriberSnapshot> {
        self.subscriber.as_ref().map(|(_, metrics)| metrics.snapshot())
    }

    /// Stop both workers, waiting up to `timeout` for each
    ///
    /// The open window is discarded. A record the subscriber is applying is
    /// settled before it exits.
    pub async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();

        if let Some((task, _)) = self.publisher {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "activity publisher panicked"),
                Err(_) => tracing::warn!("activity publisher did not finish within timeout"),
            }
        }

        if let Some((task, _)) = self.subscriber {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::warn!(error = %e, "activity subscriber failed"),
                Ok(Err(e)) => tracing::warn!(error = %e, "activity subscriber panicked"),
                Err(_) => tracing::warn!("activity subscriber did not finish within timeout"),
            }
        }

        tracing::info!("network activity pipeline stopped");
    }
}
