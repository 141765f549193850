//! Error types for the matchmaking layer.

use pairforge_bus::BusError;
use pairforge_protocol::{PlayerId, ProtocolError};

/// Errors returned by an [`Allocator`](crate::Allocator).
///
/// Every variant is treated as transient by the retry loop.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// No session server could be provisioned right now.
    #[error("no session server available: {0}")]
    Unavailable(String),

    /// A session server was found but exposes no ports to connect to.
    #[error("session server {0} exposes no ports")]
    NoPorts(String),

    /// A configured server address could not be parsed.
    #[error("invalid server address {0:?}")]
    InvalidAddress(String),
}

/// Errors publishing a match result.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The result could not be serialized.
    #[error("failed to encode match result: {0}")]
    Encode(#[source] ProtocolError),

    /// One or both publishes failed. Players not listed here were
    /// delivered to.
    #[error("failed to publish match result to {} player(s)", .failed.len())]
    Publish { failed: Vec<(PlayerId, BusError)> },
}

/// Errors from the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The bus failed outside of result delivery (e.g. subscribing).
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The pairing request could not be decoded into a player id.
    #[error("rejected pairing request: {0}")]
    Protocol(#[from] ProtocolError),

    /// The match result could not be delivered.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Allocation failed `attempts` times and the retry policy gave up.
    #[error("allocation gave up after {attempts} attempts: {source}")]
    AllocationExhausted {
        attempts: u32,
        #[source]
        source: AllocationError,
    },

    /// The coordinator is shutting down.
    #[error("cancelled")]
    Cancelled,
}

impl MatchError {
    /// Whether the pairing request that caused this error should be
    /// redelivered by the bus (nack) instead of acknowledged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Delivery(DeliveryError::Publish { .. }) | Self::Cancelled
        )
    }
}

/// Errors seen by a waiting [`RendezvousClient`](crate::RendezvousClient).
#[derive(Debug, thiserror::Error)]
pub enum RendezvousError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The wait was cancelled before a result arrived.
    #[error("cancelled while waiting for a match")]
    Cancelled,

    /// The result subscription ended (bus closed) before a result arrived.
    #[error("result subscription closed before a match was found")]
    SubscriptionClosed,
}
