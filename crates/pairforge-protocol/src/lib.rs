//! Wire protocol for Pairforge.
//!
//! This crate defines what travels between the rendezvous clients and the
//! matchmaking coordinator:
//!
//! - **Types** ([`PlayerId`], [`PairingRequest`], [`MatchResult`]): the
//!   messages published on the bus.
//! - **Topics** ([`MATCHMAKING_TOPIC`], [`result_topic`]): where those
//!   messages are published. Both sides derive a player's result topic from
//!   the `PlayerId` alone, with no side channel.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! client ──PairingRequest──▶ "matchmaking" ──▶ coordinator
//! client ◀──MatchResult──── "match_results_<id>" ◀── coordinator
//! ```

mod codec;
mod error;
mod topic;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use topic::{result_topic, MATCHMAKING_TOPIC, RESULT_TOPIC_PREFIX};
pub use types::{MatchResult, PairingRequest, PlayerId};
