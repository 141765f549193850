//! `PairforgeServer` builder and server loop.
//!
//! This is the entry point for running a matchmaking server. It ties the
//! layers together: transport → rendezvous client → bus → coordinator.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pairforge_bus::{Bus, MemoryBus, MemoryBusConfig};
use pairforge_match::{Allocator, Coordinator, MatchConfig, RendezvousClient};
use pairforge_transport::{Transport, WebSocketTransport};
use tokio_util::sync::CancellationToken;

use crate::handler::handle_connection;
use crate::PairforgeError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<A: Allocator> {
    pub(crate) coordinator: Coordinator<MemoryBus, A>,
    pub(crate) client: RendezvousClient<MemoryBus>,
    pub(crate) request_timeout: Duration,
    pub(crate) withdraw_on_disconnect: bool,
}

/// Builder for configuring and starting a Pairforge server.
///
/// # Example
///
/// ```rust,ignore
/// use pairforge::prelude::*;
///
/// let server = PairforgeServerBuilder::new()
///     .bind("0.0.0.0:3000")
///     .withdraw_on_disconnect(true)
///     .build(StaticAllocator::new("http://10.0.0.5:7777"))
///     .await?;
/// server.run(CancellationToken::new()).await
/// ```
pub struct PairforgeServerBuilder {
    bind_addr: String,
    request_timeout: Duration,
    withdraw_on_disconnect: bool,
    match_config: MatchConfig,
    bus_config: MemoryBusConfig,
}

impl PairforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            request_timeout: Duration::from_secs(5),
            withdraw_on_disconnect: false,
            match_config: MatchConfig::default(),
            bus_config: MemoryBusConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// How long a new connection has to send its match request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Removes a waiting player from the pairing slot when their
    /// connection closes before a match is found. Off by default: a player
    /// who leaves keeps their place and is paired with the next arrival.
    pub fn withdraw_on_disconnect(mut self, enabled: bool) -> Self {
        self.withdraw_on_disconnect = enabled;
        self
    }

    /// Sets the coordinator configuration.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Sets the in-memory bus configuration.
    pub fn bus_config(mut self, config: MemoryBusConfig) -> Self {
        self.bus_config = config;
        self
    }

    /// Binds the WebSocket transport and wires the coordinator to an
    /// in-memory bus.
    pub async fn build<A: Allocator>(
        self,
        allocator: A,
    ) -> Result<PairforgeServer<A>, PairforgeError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let bus = MemoryBus::with_config(self.bus_config);

        let client = RendezvousClient::new(bus.clone())
            .request_topic(self.match_config.request_topic.clone());
        let coordinator = Coordinator::new(bus.clone(), allocator, self.match_config);

        let state = Arc::new(ServerState {
            coordinator,
            client,
            request_timeout: self.request_timeout,
            withdraw_on_disconnect: self.withdraw_on_disconnect,
        });

        Ok(PairforgeServer {
            transport,
            bus,
            state,
        })
    }
}

impl Default for PairforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Pairforge server.
///
/// Call [`run()`](Self::run) to start matchmaking and accept connections.
pub struct PairforgeServer<A: Allocator> {
    transport: WebSocketTransport,
    bus: MemoryBus,
    state: Arc<ServerState<A>>,
}

impl<A: Allocator> PairforgeServer<A> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The coordinator behind this server.
    pub fn coordinator(&self) -> &Coordinator<MemoryBus, A> {
        &self.state.coordinator
    }

    /// Runs the coordinator and the accept loop until `shutdown` is
    /// cancelled.
    ///
    /// The request topic is subscribed before the first connection is
    /// accepted. On shutdown the server stops accepting, closes the bus so
    /// waiting connections end, and waits for the coordinator to drain.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinator cannot subscribe, or if it
    /// stops on its own before `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), PairforgeError> {
        let requests = self
            .bus
            .subscribe(&self.state.coordinator.config().request_topic)
            .await?;
        let mut coordinator = tokio::spawn({
            let coordinator = self.state.coordinator.clone();
            let shutdown = shutdown.clone();
            async move { coordinator.serve(requests, shutdown).await }
        });

        tracing::info!(addr = ?self.transport.local_addr().ok(), "Pairforge server running");

        let stopped_early = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break None,
                finished = &mut coordinator => break Some(finished),
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state, shutdown).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        };

        self.transport.shutdown().await?;
        self.state.coordinator.shutdown().await?;

        let outcome = match stopped_early {
            Some(finished) => finished,
            None => coordinator.await,
        };
        tracing::info!("Pairforge server stopped");
        outcome??;
        Ok(())
    }
}
