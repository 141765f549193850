//! Messages and subscriptions handed to bus consumers.

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Identifier assigned to each published message.
///
/// Redeliveries of the same publish keep the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// How a consumer settled a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Processed; do not deliver again.
    Ack,
    /// Not processed; deliver again.
    Nack,
}

/// A single delivery of a published payload.
///
/// Settle it with [`ack`](Self::ack) or [`nack`](Self::nack). Dropping a
/// message without settling it counts as a nack.
#[derive(Debug)]
pub struct Message {
    id: MessageId,
    topic: String,
    payload: Vec<u8>,
    attempt: u32,
    settle: Option<oneshot::Sender<Settlement>>,
}

impl Message {
    /// Creates a delivery. Bus implementations receive the settlement on
    /// the other end of `settle`.
    pub fn new(
        id: MessageId,
        topic: String,
        payload: Vec<u8>,
        attempt: u32,
        settle: oneshot::Sender<Settlement>,
    ) -> Self {
        Self {
            id,
            topic,
            payload,
            attempt,
            settle: Some(settle),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// 1 for the first delivery, incremented on each redelivery.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Acknowledges the message.
    pub fn ack(mut self) {
        self.settle_with(Settlement::Ack);
    }

    /// Rejects the message so it is delivered again.
    pub fn nack(mut self) {
        self.settle_with(Settlement::Nack);
    }

    fn settle_with(&mut self, settlement: Settlement) {
        if let Some(tx) = self.settle.take() {
            // The publisher side may already be gone (bus closed).
            let _ = tx.send(settlement);
        }
    }
}

/// A stream of messages for one topic.
///
/// Dropping the subscription unsubscribes: the channel is closed first, so
/// bus implementations see their sender as closed, and then the hook set
/// with [`on_unsubscribe`](Self::on_unsubscribe) runs.
pub struct Subscription {
    topic: String,
    receiver: mpsc::UnboundedReceiver<Message>,
    closed: CancellationToken,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps a channel fed by a bus implementation. The subscription ends
    /// once `closed` is cancelled or every sender is dropped.
    pub fn from_channel(
        topic: String,
        receiver: mpsc::UnboundedReceiver<Message>,
        closed: CancellationToken,
    ) -> Self {
        Self {
            topic,
            receiver,
            closed,
            unsubscribe: None,
        }
    }

    /// Runs `hook` when the subscription is dropped. Bus implementations
    /// use this to forget the subscriber right away instead of on the next
    /// publish.
    pub fn on_unsubscribe(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.unsubscribe = Some(Box::new(hook));
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next message. Returns `None` when the bus is closed.
    pub async fn next(&mut self) -> Option<Message> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            msg = self.receiver.recv() => msg,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(hook) = self.unsubscribe.take() {
            hook();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("closed", &self.closed.is_cancelled())
            .finish_non_exhaustive()
    }
}
