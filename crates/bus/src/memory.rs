//! In-process event bus
//!
//! `MemoryBus` keeps one queue per topic. Records published before anyone
//! subscribes are buffered and handed to the first subscriber in publish
//! order. Each topic has at most one live subscriber.
//!
//! Optional redelivery: a record nacked with `Unprocessed` is sent again to
//! the same subscriber, up to `max_redeliveries` extra attempts. Records
//! nacked with `UnknownType` are never redelivered.
//!
//! A delivery dropped without settling goes back into its topic backlog, in
//! publish order, and is handed to the next subscriber.
//!
//! The most recent settlements are kept in a bounded acknowledgement log
//! that tests can inspect or wait on.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::delivery::{Acknowledger, Delivery, NackCode, Settlement, Subscription};
use crate::error::{BusError, Result};
use crate::traits::{EventPublisher, EventSubscriber};

/// Settlements kept in the acknowledgement log
pub const ACK_LOG_CAPACITY: usize = 1024;

/// One settled delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckRecord {
    /// Record id
    pub id: u64,
    /// Topic the record was published to
    pub topic: String,
    /// Delivery attempt that was settled, starting at 1
    pub attempt: u32,
    /// Outcome
    pub settlement: Settlement,
}

/// In-process bus implementing both publisher and subscriber
#[derive(Clone)]
pub struct MemoryBus {
    inner: Arc<Inner>,
}

struct Inner {
    me: Weak<Inner>,
    state: Mutex<State>,
    max_redeliveries: u32,
    next_id: AtomicU64,
    published: AtomicU64,
    fail_publish: AtomicBool,
    closed: AtomicBool,
    settled: watch::Sender<usize>,
}

#[derive(Default)]
struct State {
    topics: HashMap<String, Topic>,
    inflight: HashMap<u64, Message>,
    log: VecDeque<AckRecord>,
}

#[derive(Default)]
struct Topic {
    backlog: VecDeque<Message>,
    sender: Option<mpsc::UnboundedSender<Delivery>>,
}

struct Message {
    id: u64,
    topic: String,
    attempt: u32,
    payload: Bytes,
}

impl MemoryBus {
    /// Create a bus that never redelivers
    pub fn new() -> Self {
        Self::with_redelivery(0)
    }

    /// Create a bus that redelivers `Unprocessed` nacks up to `max` times
    pub fn with_redelivery(max: u32) -> Self {
        let (settled, _) = watch::channel(0);
        let inner = Arc::new_cyclic(|me| Inner {
            me: me.clone(),
            state: Mutex::new(State::default()),
            max_redeliveries: max,
            next_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
            fail_publish: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            settled,
        });
        Self { inner }
    }

    /// Make every subsequent publish fail (or succeed again)
    pub fn fail_publish(&self, fail: bool) {
        self.inner.fail_publish.store(fail, Ordering::Relaxed);
    }

    /// Close the bus
    ///
    /// Publishing and subscribing fail from now on. Open subscriptions end
    /// once their already-delivered records are consumed.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Relaxed);
        let mut state = self.inner.state.lock();
        for topic in state.topics.values_mut() {
            topic.sender = None;
        }
    }

    /// Check if the bus was closed
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed)
    }

    /// Number of successful publishes
    pub fn published(&self) -> u64 {
        self.inner.published.load(Ordering::Relaxed)
    }

    /// Records buffered for a topic that has no live subscriber
    pub fn pending(&self, topic: &str) -> usize {
        self.inner
            .state
            .lock()
            .topics
            .get(topic)
            .map_or(0, |t| t.backlog.len())
    }

    /// Snapshot of the acknowledgement log, in settlement order
    ///
    /// Holds at most `ACK_LOG_CAPACITY` entries; older ones are evicted.
    pub fn acks(&self) -> Vec<AckRecord> {
        self.inner.state.lock().log.iter().cloned().collect()
    }

    /// Records delivered but not yet settled
    pub fn in_flight(&self) -> usize {
        self.inner.state.lock().inflight.len()
    }

    /// Wait until at least `count` deliveries have been settled
    pub async fn wait_for_settled(&self, count: usize) {
        let mut rx = self.inner.settled.subscribe();
        // The sender lives as long as `self`
        let _ = rx.wait_for(|settled| *settled >= count).await;
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBus")
            .field("max_redeliveries", &self.inner.max_redeliveries)
            .field("published", &self.published())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Inner {
    /// Hand a message to the topic's subscriber, or buffer it
    fn dispatch(&self, state: &mut State, msg: Message) {
        let topic = state.topics.entry(msg.topic.clone()).or_default();

        if let Some(sender) = &topic.sender
            && let Some(me) = self.me.upgrade()
        {
            let acker: Arc<dyn Acknowledger> = me;
            let delivery = Delivery::new(msg.id, msg.attempt, msg.payload.clone(), acker);
            match sender.send(delivery) {
                Ok(()) => {
                    trace!(id = msg.id, topic = %msg.topic, attempt = msg.attempt, "record delivered");
                    state.inflight.insert(msg.id, msg);
                    return;
                }
                Err(mpsc::error::SendError(delivery)) => {
                    // Subscriber went away; keep the record for the next one
                    delivery.disarm();
                    topic.sender = None;
                }
            }
        }

        topic.backlog.push_back(msg);
    }
}

impl Acknowledger for Inner {
    fn settle(&self, id: u64, settlement: Settlement) {
        let mut state = self.state.lock();
        let Some(mut msg) = state.inflight.remove(&id) else {
            return;
        };

        debug!(id, topic = %msg.topic, attempt = msg.attempt, ?settlement, "record settled");
        if state.log.len() == ACK_LOG_CAPACITY {
            state.log.pop_front();
        }
        state.log.push_back(AckRecord {
            id,
            topic: msg.topic.clone(),
            attempt: msg.attempt,
            settlement,
        });

        let redeliver = settlement == Settlement::Nack(NackCode::Unprocessed)
            && msg.attempt <= self.max_redeliveries
            && !self.closed.load(Ordering::Relaxed);
        if redeliver {
            msg.attempt += 1;
            self.dispatch(&mut state, msg);
        }
        drop(state);

        self.settled.send_modify(|settled| *settled += 1);
    }

    fn release(&self, id: u64) {
        let mut state = self.state.lock();
        let Some(msg) = state.inflight.remove(&id) else {
            return;
        };
        if self.closed.load(Ordering::Relaxed) {
            return;
        }

        debug!(id, topic = %msg.topic, attempt = msg.attempt, "unsettled record returned to backlog");
        let topic = state.topics.entry(msg.topic.clone()).or_default();
        let at = topic.backlog.partition_point(|m| m.id < msg.id);
        topic.backlog.insert(at, msg);
    }
}

#[async_trait]
impl EventPublisher for MemoryBus {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        if self.inner.fail_publish.load(Ordering::Relaxed) {
            return Err(BusError::publish(topic, "publishing is disabled"));
        }

        let msg = Message {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            topic: topic.to_string(),
            attempt: 1,
            payload,
        };
        let mut state = self.inner.state.lock();
        self.inner.dispatch(&mut state, msg);
        drop(state);

        self.inner.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for MemoryBus {
    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.state.lock();
        let entry = state.topics.entry(topic.to_string()).or_default();
        if entry.sender.as_ref().is_some_and(|s| !s.is_closed()) {
            return Err(BusError::subscribe(topic, "topic already has a subscriber"));
        }

        entry.sender = Some(tx);
        let backlog = std::mem::take(&mut entry.backlog);
        for msg in backlog {
            self.inner.dispatch(&mut state, msg);
        }

        debug!(topic, "subscription opened");
        Ok(Subscription::new(topic, rx))
    }
}
