//! Unified error type for Pairforge.

use pairforge_bus::BusError;
use pairforge_match::{AllocationError, MatchError, RendezvousError};
use pairforge_protocol::ProtocolError;
use pairforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairforgeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Bus(#[from] BusError),

    /// The coordinator failed.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A connection's wait for a match failed.
    #[error(transparent)]
    Rendezvous(#[from] RendezvousError),

    /// Session server configuration is invalid.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// The coordinator task panicked or was aborted.
    #[error("coordinator task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
