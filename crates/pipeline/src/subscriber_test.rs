//! Tests for the activity subscriber

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use netpulse_bus::{BusError, Bytes, EventPublisher, MemoryBus, NackCode, Settlement};
use netpulse_protocol::{
    Activity, Event, Mimetype, NETWORK_ACTIVITY_EVENT_TYPE, Network, NetworkActivity,
};
use netpulse_store::{ActivityStore, MemoryStore, MonthBucket, StoreError};

use crate::error::PipelineError;
use crate::subscriber::{ActivitySubscriber, SubscriberConfig};

const TOPIC: &str = "network-activity";
const WAIT: Duration = Duration::from_secs(2);

/// Memory store with switchable faults
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_retrieve: AtomicBool,
    fail_update: AtomicBool,
    slow: AtomicBool,
}

impl FlakyStore {
    async fn delay(&self) {
        if self.slow.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
}

#[async_trait]
impl ActivityStore for FlakyStore {
    async fn retrieve_month(&self, month: &str) -> netpulse_store::Result<MonthBucket> {
        self.delay().await;
        if self.fail_retrieve.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("retrieve refused"));
        }
        self.inner.retrieve_month(month).await
    }

    async fn update_month(&self, bucket: &mut MonthBucket) -> netpulse_store::Result<()> {
        self.delay().await;
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("update refused"));
        }
        self.inner.update_month(bucket).await
    }

    async fn delete_month(&self, month: &str) -> netpulse_store::Result<()> {
        self.inner.delete_month(month).await
    }

    async fn count_months(&self) -> netpulse_store::Result<usize> {
        self.inner.count_months().await
    }
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 8, day, 12, 0, 0).unwrap()
}

fn window(start: DateTime<Utc>) -> NetworkActivity {
    let mut window = NetworkActivity::new(Network::MainNet, Duration::from_secs(300), start);
    window.incr_organization("alice", Activity::Lookup);
    window.incr(Activity::Lookup);
    for _ in 0..3 {
        window.incr_organization("bob", Activity::Search);
    }
    window
}

fn payload(window: &NetworkActivity) -> Bytes {
    window.encode().unwrap()
}

fn subscriber(store: Arc<dyn ActivityStore>, store_timeout: Duration) -> ActivitySubscriber {
    let config = SubscriberConfig {
        topic: TOPIC.to_string(),
        store_timeout,
    };
    ActivitySubscriber::new(config, Arc::new(MemoryBus::new()), store)
}

fn lookups(bucket: &MonthBucket, date: &str) -> u64 {
    bucket
        .day(date)
        .and_then(|day| day.activity.get(Network::MainNet))
        .map_or(0, |counts| counts.get(Activity::Lookup))
}

// =============================================================================
// Permanent errors
// =============================================================================

#[tokio::test]
async fn test_garbage_is_unknown_type() {
    let store = Arc::new(MemoryStore::new());
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    let settlement = sub.process(b"not an activity record").await;
    assert_eq!(settlement, Settlement::Nack(NackCode::UnknownType));
    assert_eq!(store.count_months().await.unwrap(), 0);

    let snapshot = sub.metrics_handle().snapshot();
    assert_eq!(snapshot.permanent_errors, 1);
    assert_eq!(snapshot.records_acked, 0);
}

#[tokio::test]
async fn test_wrong_mimetype_is_unknown_type() {
    let store = Arc::new(MemoryStore::new());
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    let event = Event::new(
        NETWORK_ACTIVITY_EVENT_TYPE,
        Mimetype::ApplicationJson,
        b"{}".to_vec(),
    );
    let settlement = sub.process(&event.encode().unwrap()).await;
    assert_eq!(settlement, Settlement::Nack(NackCode::UnknownType));
    assert_eq!(store.count_months().await.unwrap(), 0);

    let err = sub.merge(&event.encode().unwrap()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
}

#[tokio::test]
async fn test_window_past_year_9999_is_unknown_type() {
    let store = Arc::new(FlakyStore::default());
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    let start = Utc.with_ymd_and_hms(9999, 12, 31, 23, 0, 0).unwrap();
    let mut update = NetworkActivity::new(Network::MainNet, Duration::from_secs(2 * 3600), start);
    update.incr(Activity::Lookup);
    assert_eq!(update.month(), "+10000-01");

    // Redelivery cannot fix the month, so every attempt is rejected outright
    for _ in 0..2 {
        let settlement = sub.process(&payload(&update)).await;
        assert_eq!(settlement, Settlement::Nack(NackCode::UnknownType));
    }

    let err = sub.merge(&payload(&update)).await.unwrap_err();
    assert!(err.is_permanent());
    assert!(matches!(
        err,
        PipelineError::Store {
            source: StoreError::InvalidKey { .. },
            ..
        }
    ));

    // Rejected before the store was consulted
    store.fail_retrieve.store(true, Ordering::SeqCst);
    assert!(sub.merge(&payload(&update)).await.unwrap_err().is_permanent());
    assert_eq!(store.count_months().await.unwrap(), 0);

    let snapshot = sub.metrics_handle().snapshot();
    assert_eq!(snapshot.permanent_errors, 2);
    assert_eq!(snapshot.transient_errors, 0);
}

// =============================================================================
// Merging
// =============================================================================

#[tokio::test]
async fn test_first_record_creates_month() {
    let store = Arc::new(MemoryStore::new());
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    let settlement = sub.process(&payload(&window(at(24)))).await;
    assert_eq!(settlement, Settlement::Ack);

    let bucket = store.retrieve_month("2023-08").await.unwrap();
    assert!(bucket.created.is_some());
    assert_eq!(bucket.days.len(), 1);

    let day = bucket.day("2023-08-24").unwrap();
    let counts = day.activity.get(Network::MainNet).unwrap();
    assert_eq!(counts.get(Activity::Lookup), 2);
    assert_eq!(counts.get(Activity::Search), 3);
    assert_eq!(
        day.organizations["alice"]
            .get(Network::MainNet)
            .unwrap()
            .get(Activity::Lookup),
        1
    );
    assert_eq!(
        day.organizations["bob"]
            .get(Network::MainNet)
            .unwrap()
            .get(Activity::Search),
        3
    );
    assert!(day.activity.get(Network::TestNet).is_none());
}

#[tokio::test]
async fn test_records_accumulate_by_day() {
    let store = Arc::new(MemoryStore::new());
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    assert_eq!(sub.merge(&payload(&window(at(24)))).await.unwrap(), "2023-08");
    assert_eq!(sub.merge(&payload(&window(at(24)))).await.unwrap(), "2023-08");
    assert_eq!(sub.merge(&payload(&window(at(2)))).await.unwrap(), "2023-08");

    let bucket = store.retrieve_month("2023-08").await.unwrap();
    assert_eq!(lookups(&bucket, "2023-08-24"), 4);
    assert_eq!(lookups(&bucket, "2023-08-02"), 2);

    let dates: Vec<_> = bucket.days.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(dates, ["2023-08-02", "2023-08-24"]);
}

#[tokio::test]
async fn test_window_ending_next_month_goes_to_next_month() {
    let store = Arc::new(MemoryStore::new());
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    let start = Utc.with_ymd_and_hms(2023, 8, 31, 23, 58, 0).unwrap();
    assert_eq!(sub.merge(&payload(&window(start))).await.unwrap(), "2023-09");

    let bucket = store.retrieve_month("2023-09").await.unwrap();
    assert_eq!(lookups(&bucket, "2023-09-01"), 2);
    assert!(store.retrieve_month("2023-08").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_redelivery_counts_twice() {
    let store = Arc::new(MemoryStore::new());
    let sub = subscriber(store.clone(), Duration::from_secs(1));
    let record = payload(&window(at(24)));

    assert_eq!(sub.process(&record).await, Settlement::Ack);
    assert_eq!(sub.process(&record).await, Settlement::Ack);

    let bucket = store.retrieve_month("2023-08").await.unwrap();
    assert_eq!(lookups(&bucket, "2023-08-24"), 4);
}

// =============================================================================
// Transient errors
// =============================================================================

#[tokio::test]
async fn test_update_failure_keeps_previous_state() {
    let store = Arc::new(FlakyStore::default());
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    assert_eq!(sub.process(&payload(&window(at(24)))).await, Settlement::Ack);

    store.fail_update.store(true, Ordering::SeqCst);
    let settlement = sub.process(&payload(&window(at(24)))).await;
    assert_eq!(settlement, Settlement::Nack(NackCode::Unprocessed));

    let bucket = store.retrieve_month("2023-08").await.unwrap();
    assert_eq!(lookups(&bucket, "2023-08-24"), 2);

    let snapshot = sub.metrics_handle().snapshot();
    assert_eq!(snapshot.records_acked, 1);
    assert_eq!(snapshot.transient_errors, 1);
}

#[tokio::test]
async fn test_month_creation_failure_is_unprocessed() {
    let store = Arc::new(FlakyStore::default());
    store.fail_update.store(true, Ordering::SeqCst);
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    let err = sub.merge(&payload(&window(at(24)))).await.unwrap_err();
    assert!(matches!(err, PipelineError::Store { ref month, .. } if month == "2023-08"));
    assert!(!err.is_permanent());
    assert_eq!(store.count_months().await.unwrap(), 0);
}

#[tokio::test]
async fn test_retrieve_failure_is_unprocessed() {
    let store = Arc::new(FlakyStore::default());
    store.fail_retrieve.store(true, Ordering::SeqCst);
    let sub = subscriber(store.clone(), Duration::from_secs(1));

    let settlement = sub.process(&payload(&window(at(24)))).await;
    assert_eq!(settlement, Settlement::Nack(NackCode::Unprocessed));
    assert_eq!(store.count_months().await.unwrap(), 0);
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let store = Arc::new(FlakyStore::default());
    store.slow.store(true, Ordering::SeqCst);
    let sub = subscriber(store.clone(), Duration::from_millis(20));

    let err = sub.merge(&payload(&window(at(24)))).await.unwrap_err();
    assert!(matches!(err, PipelineError::StoreTimeout { .. }));

    let settlement = sub.process(&payload(&window(at(24)))).await;
    assert_eq!(settlement, Settlement::Nack(NackCode::Unprocessed));
}

// =============================================================================
// Worker loop
// =============================================================================

#[tokio::test]
async fn test_run_settles_every_delivery() {
    let bus = MemoryBus::new();
    let store = Arc::new(MemoryStore::new());
    bus.publish(TOPIC, payload(&window(at(24)))).await.unwrap();
    bus.publish(TOPIC, Bytes::from_static(b"garbage")).await.unwrap();

    let config = SubscriberConfig {
        topic: TOPIC.to_string(),
        store_timeout: Duration::from_secs(1),
    };
    let sub = ActivitySubscriber::new(config, Arc::new(bus.clone()), store.clone());
    let metrics = sub.metrics_handle();
    let task = sub.spawn(CancellationToken::new());

    timeout(WAIT, bus.wait_for_settled(2)).await.unwrap();
    let settlements: Vec<_> = bus.acks().into_iter().map(|a| a.settlement).collect();
    assert_eq!(
        settlements,
        [Settlement::Ack, Settlement::Nack(NackCode::UnknownType)]
    );

    // Closing the bus ends the subscription and the worker
    bus.close();
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.records_received, 2);
    assert_eq!(snapshot.in_flight(), 0);
    assert_eq!(store.count_months().await.unwrap(), 1);
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let bus = MemoryBus::new();
    let config = SubscriberConfig {
        topic: TOPIC.to_string(),
        store_timeout: Duration::from_secs(1),
    };
    let sub = ActivitySubscriber::new(config, Arc::new(bus), Arc::new(MemoryStore::new()));
    let cancel = CancellationToken::new();
    let task = sub.spawn(cancel.clone());

    cancel.cancel();
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_subscribe_failure_is_fatal() {
    let bus = MemoryBus::new();
    bus.close();

    let config = SubscriberConfig {
        topic: TOPIC.to_string(),
        store_timeout: Duration::from_secs(1),
    };
    let sub = ActivitySubscriber::new(config, Arc::new(bus), Arc::new(MemoryStore::new()));

    let err = sub.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Bus(BusError::Closed)));
}
