//! The waiting half of matchmaking.

use pairforge_bus::Bus;
use pairforge_protocol::{
    result_topic, Codec, JsonCodec, MatchResult, PairingRequest, PlayerId, MATCHMAKING_TOPIC,
};
use tokio_util::sync::CancellationToken;

use crate::RendezvousError;

/// Requests a match for one player and waits for the result.
#[derive(Debug, Clone)]
pub struct RendezvousClient<B, C = JsonCodec> {
    bus: B,
    codec: C,
    request_topic: String,
}

impl<B: Bus> RendezvousClient<B, JsonCodec> {
    pub fn new(bus: B) -> Self {
        Self::with_codec(bus, JsonCodec)
    }
}

impl<B: Bus, C: Codec> RendezvousClient<B, C> {
    pub fn with_codec(bus: B, codec: C) -> Self {
        Self {
            bus,
            codec,
            request_topic: MATCHMAKING_TOPIC.to_string(),
        }
    }

    /// Publishes requests to `topic` instead of the default.
    pub fn request_topic(mut self, topic: impl Into<String>) -> Self {
        self.request_topic = topic.into();
        self
    }

    /// Publishes a pairing request for `player` and waits for its result.
    ///
    /// The result topic is subscribed before the request is published, so
    /// a result delivered immediately after pairing is never missed.
    /// Payloads on the result topic that do not decode are skipped.
    ///
    /// # Errors
    ///
    /// - [`RendezvousError::Bus`] if subscribing or publishing fails.
    /// - [`RendezvousError::Cancelled`] if `cancel` fires first.
    /// - [`RendezvousError::SubscriptionClosed`] if the bus closes first.
    pub async fn request_match(
        &self,
        player: &PlayerId,
        cancel: &CancellationToken,
    ) -> Result<MatchResult, RendezvousError> {
        let topic = result_topic(player);
        let mut results = self.bus.subscribe(&topic).await?;

        let request = self.codec.encode(&PairingRequest {
            player: player.clone(),
        })?;
        self.bus.publish(&self.request_topic, request).await?;
        tracing::debug!(%player, %topic, "pairing request published");

        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RendezvousError::Cancelled),
                message = results.next() => message,
            };
            let Some(message) = message else {
                return Err(RendezvousError::SubscriptionClosed);
            };

            match self.codec.decode::<MatchResult>(message.payload()) {
                Ok(result) => {
                    message.ack();
                    tracing::info!(%player, endpoint = %result.endpoint, "match found");
                    return Ok(result);
                }
                Err(error) => {
                    tracing::warn!(%player, error = %error, "skipping undecodable match result");
                    message.ack();
                }
            }
        }
    }
}
