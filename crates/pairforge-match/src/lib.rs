//! Matchmaking core for Pairforge.
//!
//! Pairs anonymous players two at a time, provisions a session server for
//! each pair, and hands the endpoint to both players over the bus.
//!
//! # Key types
//!
//! - [`PairingSlot`]: holds the single player currently waiting
//! - [`Allocator`]: provisions a session server for a formed pair
//! - [`allocate_with_retry`]: retries allocation with a fixed backoff
//! - [`deliver`]: publishes a [`MatchResult`](pairforge_protocol::MatchResult)
//!   to both players' result topics
//! - [`Coordinator`]: consumes pairing requests and drives all of the above
//! - [`RendezvousClient`]: the waiting half used once per connected player
//!
//! # Flow
//!
//! ```text
//! RendezvousClient ──publish──▶ "matchmaking" ──▶ Coordinator::handle
//!                                                   │
//!                                   PairingSlot::offer ── Waiting ──▶ done
//!                                                   │ Paired
//!                                   allocate_with_retry
//!                                                   │
//! RendezvousClient ◀── "match_results_<id>" ◀── deliver (both players)
//! ```

#![allow(async_fn_in_trait)]

mod allocator;
mod config;
mod coordinator;
mod delivery;
mod error;
mod rendezvous;
mod retry;
mod slot;

pub use allocator::{Allocator, RoundRobinAllocator, ServerAddress, StaticAllocator};
pub use config::{MatchConfig, RetryPolicy};
pub use coordinator::{Coordinator, HandleOutcome};
pub use delivery::deliver;
pub use error::{AllocationError, DeliveryError, MatchError, RendezvousError};
pub use rendezvous::RendezvousClient;
pub use retry::{allocate_with_retry, Allocation};
pub use slot::{Offer, Pair, PairingSlot};
