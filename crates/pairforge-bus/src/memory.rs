//! In-process bus backed by Tokio channels.
//!
//! Every topic maps to the senders of its live subscriptions. A publish
//! clones the payload into one [`Message`] per sender. Each message carries
//! a oneshot settlement channel, and a small task per delivery waits on it:
//! an ack ends the task, a nack or a drop sleeps for
//! [`MemoryBusConfig::redelivery_delay`] and sends the message again.
//!
//! Result topics are used once per player, so the map would grow without
//! bound if entries outlived their subscriptions. Dropping a
//! [`Subscription`] removes its sender, and a topic whose last sender goes
//! away is removed from the map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::message::Settlement;
use crate::{validate_topic, Bus, BusError, Message, MessageId, Subscription};

type SubscriberSender = mpsc::UnboundedSender<Message>;

/// Configuration for [`MemoryBus`].
#[derive(Debug, Clone)]
pub struct MemoryBusConfig {
    /// How long to wait before redelivering a nacked message.
    pub redelivery_delay: Duration,
}

impl Default for MemoryBusConfig {
    fn default() -> Self {
        Self {
            redelivery_delay: Duration::from_millis(100),
        }
    }
}

/// An in-memory [`Bus`].
///
/// Each publish is fanned out to every live subscriber of the topic, and
/// each subscriber gets its own delivery loop that redelivers until the
/// message is acked. Messages published to a topic without subscribers
/// are dropped, which is why a waiter must subscribe before it asks for
/// anything to be published to it.
///
/// Cloning is cheap; all clones share the same topics.
#[derive(Clone)]
pub struct MemoryBus {
    inner: Arc<Inner>,
}

struct Inner {
    config: MemoryBusConfig,
    topics: Mutex<HashMap<String, Vec<SubscriberSender>>>,
    closed: CancellationToken,
    next_id: AtomicU64,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::with_config(MemoryBusConfig::default())
    }

    pub fn with_config(config: MemoryBusConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                topics: Mutex::new(HashMap::new()),
                closed: CancellationToken::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.live_subscribers(topic).len()
    }

    /// Number of topics with at least one registered subscription.
    pub fn topic_count(&self) -> usize {
        self.inner
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Returns the senders of live subscribers, pruning dropped ones.
    fn live_subscribers(&self, topic: &str) -> Vec<SubscriberSender> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut topics, topic)
    }
}

/// Drops closed senders for `topic`, removing the topic once none are left.
/// Returns the remaining senders.
fn prune(
    topics: &mut HashMap<String, Vec<SubscriberSender>>,
    topic: &str,
) -> Vec<SubscriberSender> {
    let Some(senders) = topics.get_mut(topic) else {
        return Vec::new();
    };
    senders.retain(|s| !s.is_closed());
    if senders.is_empty() {
        topics.remove(topic);
        return Vec::new();
    }
    senders.clone()
}

impl Bus for MemoryBus {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<(), BusError> {
        validate_topic(topic)?;
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let id = MessageId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let subscribers = self.inner.live_subscribers(topic);
        if subscribers.is_empty() {
            tracing::debug!(topic, %id, "no subscribers, message dropped");
            return Ok(());
        }

        tracing::trace!(topic, %id, subscribers = subscribers.len(), "publishing");
        for sender in subscribers {
            tokio::spawn(deliver(
                sender,
                id,
                topic.to_string(),
                payload.clone(),
                self.inner.config.redelivery_delay,
                self.inner.closed.clone(),
            ));
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        validate_topic(topic)?;
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        tracing::debug!(topic, "subscribed");

        let inner = Arc::downgrade(&self.inner);
        let key = topic.to_string();
        Ok(Subscription::from_channel(topic.to_string(), rx, self.inner.closed.clone())
            .on_unsubscribe(move || {
                if let Some(inner) = inner.upgrade() {
                    let mut topics = inner.topics.lock().unwrap_or_else(PoisonError::into_inner);
                    prune(&mut topics, &key);
                    tracing::trace!(topic = %key, "unsubscribed");
                }
            }))
    }

    async fn close(&self) -> Result<(), BusError> {
        if self.inner.closed.is_cancelled() {
            return Ok(());
        }
        self.inner.closed.cancel();
        self.inner
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("memory bus closed");
        Ok(())
    }
}

/// Delivers one publish to one subscriber until it is acked, the
/// subscriber goes away, or the bus closes.
async fn deliver(
    sender: SubscriberSender,
    id: MessageId,
    topic: String,
    payload: Vec<u8>,
    redelivery_delay: Duration,
    closed: CancellationToken,
) {
    let mut attempt = 1;
    loop {
        let (settle_tx, settle_rx) = oneshot::channel();
        let msg =
            Message::new(id, topic.clone(), payload.clone(), attempt, settle_tx);
        if sender.send(msg).is_err() {
            tracing::trace!(%topic, %id, "subscriber gone before delivery");
            return;
        }

        let settlement = tokio::select! {
            _ = closed.cancelled() => return,
            settlement = settle_rx => settlement,
        };
        if let Ok(Settlement::Ack) = settlement {
            return;
        }
        if sender.is_closed() {
            return;
        }

        tracing::debug!(%topic, %id, attempt, "message not acknowledged, redelivering");
        tokio::select! {
            _ = closed.cancelled() => return,
            _ = tokio::time::sleep(redelivery_delay) => {}
        }
        attempt += 1;
    }
}
