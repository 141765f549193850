//! # Pairforge
//!
//! Two-player matchmaking for web games.
//!
//! Clients connect over WebSocket and send one message to ask for a match.
//! Pairforge pairs them two at a time, provisions a session server for each
//! pair, and sends both players the same endpoint URI before closing the
//! connection.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairforge::prelude::*;
//!
//! # async fn start() -> Result<(), PairforgeError> {
//! pairforge::init_tracing();
//!
//! let server = PairforgeServerBuilder::new()
//!     .bind("0.0.0.0:3000")
//!     .build(StaticAllocator::new("http://10.0.0.5:7777"))
//!     .await?;
//!
//! let shutdown = CancellationToken::new();
//! server.run(shutdown).await
//! # }
//! ```

mod error;
mod handler;
mod logging;
mod server;

pub use error::PairforgeError;
pub use logging::init_tracing;
pub use server::{PairforgeServer, PairforgeServerBuilder};

pub mod prelude {
    pub use crate::{init_tracing, PairforgeError, PairforgeServer, PairforgeServerBuilder};
    pub use pairforge_bus::{Bus, MemoryBus, MemoryBusConfig};
    pub use pairforge_match::{
        Allocator, AllocationError, Coordinator, MatchConfig, RendezvousClient, RetryPolicy,
        RoundRobinAllocator, ServerAddress, StaticAllocator,
    };
    pub use pairforge_protocol::{MatchResult, PlayerId};
    pub use tokio_util::sync::CancellationToken;
}
