//! Activity subscriber
//!
//! Consumes published windows from the event bus and merges them into the
//! month bucket store. Every delivery is settled exactly once:
//!
//! - decoded and stored: ack
//! - undecodable, unexpected type or no valid month: nack `UNKNOWN_TYPE`,
//!   store untouched
//! - store failed or timed out: nack `UNPROCESSED`
//!
//! Records are applied one at a time, so a month bucket is never written by
//! two updates at once from this process.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use netpulse_bus::{Delivery, EventSubscriber, NackCode, Settlement};
use netpulse_config::ActivityConfig;
use netpulse_protocol::NetworkActivity;
use netpulse_store::{ActivityStore, MonthBucket, StoreError, ensure_month, validate_month};

use crate::error::{PipelineError, Result};
use crate::metrics::{SubscriberMetrics, SubscriberSnapshot};

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Topic windows are consumed from
    pub topic: String,
    /// Upper bound on each store call
    pub store_timeout: Duration,
}

impl SubscriberConfig {
    /// Build subscriber settings from the activity section
    pub fn from_activity(config: &ActivityConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            store_timeout: config.store_timeout,
        }
    }
}

/// Handle for reading subscriber metrics while the worker runs
#[derive(Debug, Clone)]
pub struct SubscriberMetricsHandle {
    metrics: Arc<SubscriberMetrics>,
}

impl SubscriberMetricsHandle {
    pub fn snapshot(&self) -> SubscriberSnapshot {
        self.metrics.snapshot()
    }
}

/// Background worker that merges windows into the store
pub struct ActivitySubscriber {
    config: SubscriberConfig,
    bus: Arc<dyn EventSubscriber>,
    store: Arc<dyn ActivityStore>,
    metrics: Arc<SubscriberMetrics>,
}

impl ActivitySubscriber {
    pub fn new(
        config: SubscriberConfig,
        bus: Arc<dyn EventSubscriber>,
        store: Arc<dyn ActivityStore>,
    ) -> Self {
        Self {
            config,
            bus,
            store,
            metrics: Arc::new(SubscriberMetrics::new()),
        }
    }

    pub fn metrics_handle(&self) -> SubscriberMetricsHandle {
        SubscriberMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Spawn the worker on the current runtime
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until cancelled or the subscription ends
    ///
    /// Fails only if the subscription cannot be opened. Cancellation is
    /// checked between records; a record being applied is always settled.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut subscription = match self.bus.subscribe(&self.config.topic).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    topic = %self.config.topic,
                    fatal = true,
                    "could not subscribe to network activity topic"
                );
                return Err(PipelineError::Bus(e));
            }
        };

        tracing::info!(topic = %self.config.topic, "activity subscriber started");

        loop {
            let delivery = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!("activity subscriber cancelled");
                    break;
                }

                delivery = subscription.recv() => match delivery {
                    Some(delivery) => delivery,
                    None => {
                        tracing::debug!("activity subscription closed");
                        break;
                    }
                },
            };

            self.handle(delivery).await;
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            records_received = snapshot.records_received,
            records_acked = snapshot.records_acked,
            permanent_errors = snapshot.permanent_errors,
            transient_errors = snapshot.transient_errors,
            "activity subscriber shutting down"
        );

        Ok(())
    }

    /// Apply one delivery and settle it
    pub async fn handle(&self, delivery: Delivery) {
        self.metrics.record_received();
        match self.process(delivery.payload()).await {
            Settlement::Ack => delivery.ack(),
            Settlement::Nack(code) => delivery.nack(code),
        }
    }

    /// Apply one record and decide how it should be settled
    pub async fn process(&self, payload: &[u8]) -> Settlement {
        match self.merge(payload).await {
            Ok(month) => {
                self.metrics.record_acked();
                tracing::trace!(month = %month, "merged activity window");
                Settlement::Ack
            }
            Err(e) if e.is_permanent() => {
                self.metrics.record_permanent_error();
                tracing::error!(error = %e, "could not parse network activity record");
                Settlement::Nack(NackCode::UnknownType)
            }
            Err(e) => {
                self.metrics.record_transient_error();
                tracing::error!(error = %e, "could not store network activity record");
                Settlement::Nack(NackCode::Unprocessed)
            }
        }
    }

    /// Decode a record and merge it into its month bucket
    ///
    /// Returns the month that was updated.
    pub async fn merge(&self, payload: &[u8]) -> Result<String> {
        let update = NetworkActivity::decode(payload).map_err(PipelineError::Decode)?;
        let month = update.month();
        validate_month(&month).map_err(|e| PipelineError::store(&month, e))?;

        let mut bucket = match self
            .store_call(&month, self.store.retrieve_month(&month))
            .await
        {
            Ok(bucket) => bucket,
            Err(PipelineError::Store { source, .. }) if source.is_not_found() => {
                self.create_month(&month).await?
            }
            Err(e) => return Err(e),
        };

        bucket.add(&update);
        self.store_call(&month, self.store.update_month(&mut bucket))
            .await?;

        Ok(month)
    }

    /// Persist an empty bucket for a month seen for the first time
    async fn create_month(&self, month: &str) -> Result<MonthBucket> {
        let mut bucket = ensure_month(month).map_err(|e| PipelineError::store(month, e))?;
        self.store_call(month, self.store.update_month(&mut bucket))
            .await?;

        tracing::debug!(month = %month, "created activity month");
        Ok(bucket)
    }

    async fn store_call<T>(
        &self,
        month: &str,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result.map_err(|e| PipelineError::store(month, e)),
            Err(_) => Err(PipelineError::StoreTimeout {
                month: month.to_string(),
                timeout: self.config.store_timeout,
            }),
        }
    }
}
