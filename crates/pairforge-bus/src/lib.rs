//! Topic-addressed publish/subscribe for Pairforge.
//!
//! The bus is the only medium shared by the matchmaking coordinator and the
//! per-client rendezvous waiters. Delivery is at-least-once: a subscriber
//! acknowledges each [`Message`], and a negatively acknowledged (or dropped)
//! message is delivered again. There is no ordering guarantee across
//! topics.
//!
//! - [`Bus`]: the trait the coordinator and clients are written against
//! - [`MemoryBus`]: an in-process implementation backed by Tokio channels

mod error;
mod memory;
mod message;

pub use error::BusError;
pub use memory::{MemoryBus, MemoryBusConfig};
pub use message::{Message, MessageId, Settlement, Subscription};

use std::future::Future;

/// A topic-addressed publish/subscribe primitive.
///
/// The coordinator subscribes to the request topic and publishes results;
/// each rendezvous client subscribes to its own result topic and publishes
/// one request. Neither side holds a reference to the other, only to a
/// `Bus`.
///
/// ## Trait bounds
///
/// - `Send + Sync`: one bus handle is shared by the run loop and every
///   handler task it spawns, on whatever worker thread Tokio picks.
/// - `'static`: the bus outlives any single request, so it may not borrow
///   anything shorter-lived.
///
/// The methods return `impl Future + Send` rather than being declared
/// `async fn`, so a generic caller can `tokio::spawn` the future.
///
/// ## Delivery contract
///
/// A subscriber sees a [`Message`] and must settle it. [`Message::ack`]
/// ends delivery. [`Message::nack`], or dropping the message unsettled,
/// schedules a redelivery with [`Message::attempt`] incremented. A
/// subscriber can therefore see the same payload more than once and has
/// to tolerate that.
///
/// ## Example
///
/// ```rust
/// use pairforge_bus::{Bus, MemoryBus};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), pairforge_bus::BusError> {
/// let bus = MemoryBus::new();
/// let mut results = bus.subscribe("match_results_p1").await?;
///
/// bus.publish("match_results_p1", b"hello".to_vec()).await?;
///
/// let message = results.next().await.expect("subscription open");
/// assert_eq!(message.payload(), b"hello");
/// message.ack();
/// # Ok(())
/// # }
/// ```
pub trait Bus: Send + Sync + 'static {
    /// Publishes `payload` to every current subscriber of `topic`.
    ///
    /// Publishing to a topic nobody subscribes to is not an error; the
    /// message is simply not observed by anyone.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Subscribes to `topic`. Only messages published after this call
    /// returns are delivered to the subscription.
    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, BusError>> + Send;

    /// Closes the bus. Open subscriptions end and later calls fail with
    /// [`BusError::Closed`].
    fn close(&self) -> impl Future<Output = Result<(), BusError>> + Send;
}

/// Rejects topic names no implementation can route.
pub(crate) fn validate_topic(topic: &str) -> Result<(), BusError> {
    if topic.is_empty() || topic.chars().any(char::is_whitespace) {
        return Err(BusError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_topic_accepts_result_topics() {
        assert!(validate_topic("matchmaking").is_ok());
        assert!(validate_topic("match_results_p1").is_ok());
    }

    #[test]
    fn test_validate_topic_rejects_empty_and_whitespace() {
        assert!(matches!(validate_topic(""), Err(BusError::InvalidTopic(_))));
        assert!(matches!(
            validate_topic("match results"),
            Err(BusError::InvalidTopic(_))
        ));
    }
}
