//! Publishing a match result to both players.

use pairforge_bus::Bus;
use pairforge_protocol::{result_topic, Codec, MatchResult};

use crate::{DeliveryError, Pair};

/// Publishes `result` to the result topic of each player in `pair`.
///
/// Both publishes are always attempted; a failure for the first player
/// does not skip the second.
///
/// # Errors
///
/// [`DeliveryError::Publish`] lists every player whose publish failed.
pub async fn deliver<B: Bus, C: Codec>(
    bus: &B,
    codec: &C,
    pair: &Pair,
    result: &MatchResult,
) -> Result<(), DeliveryError> {
    let payload = codec.encode(result).map_err(DeliveryError::Encode)?;

    let mut failed = Vec::new();
    for player in pair.players() {
        let topic = result_topic(player);
        match bus.publish(&topic, payload.clone()).await {
            Ok(()) => tracing::debug!(%player, %topic, "match result published"),
            Err(error) => {
                tracing::warn!(%player, %topic, error = %error, "failed to publish match result");
                failed.push((player.clone(), error));
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(DeliveryError::Publish { failed })
    }
}
