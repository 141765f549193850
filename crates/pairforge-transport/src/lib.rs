//! Client-facing transport layer for Pairforge.
//!
//! Players reach the matchmaker over a long-lived connection. A player
//! sends one message to ask for a match, then waits, and finally receives
//! exactly one text message carrying the endpoint of their session server.
//! While waiting, the only other thing that matters is whether the player
//! is still there.
//!
//! The [`Transport`] and [`Connection`] traits capture just that exchange,
//! so the server loop never touches the wire protocol directly.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Identifies one accepted connection in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Stops accepting new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single waiting player.
///
/// Reading and writing are independent: one task may sit in
/// [`recv`](Self::recv) watching for the player to leave while another
/// sends the reply with [`send_text`](Self::send_text).
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Receives the next message from the player. Its content is opaque.
    ///
    /// Returns `Ok(None)` once the player has closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Sends a text message to the player.
    ///
    /// The endpoint reply goes out this way so browser clients can read
    /// the URI directly.
    async fn send_text(&self, text: &str) -> Result<(), Self::Error>;

    /// Closes the connection. Closing a connection the player already
    /// closed is not an error.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
