//! Per-connection handler: match request, rendezvous, endpoint reply.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive one message (its content is not inspected) → the client
//!      wants a match
//!   2. Assign a fresh PlayerId and wait for a result on the bus, while
//!      watching for the client going away
//!   3. Send the endpoint URI as a single text frame and close

use std::sync::Arc;

use pairforge_match::{Allocator, RendezvousError};
use pairforge_protocol::{PlayerId, ProtocolError};
use pairforge_transport::{Connection, TransportError, WebSocketConnection};
use tokio_util::sync::CancellationToken;

use crate::server::ServerState;
use crate::PairforgeError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A: Allocator>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A>>,
    shutdown: CancellationToken,
) -> Result<(), PairforgeError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Match request ---
    match tokio::time::timeout(state.request_timeout, conn.recv()).await {
        Ok(Ok(Some(_))) => {}
        Ok(Ok(None)) => {
            tracing::debug!(%conn_id, "connection closed before requesting a match");
            return Ok(());
        }
        Ok(Err(e)) => return Err(PairforgeError::Transport(e)),
        Err(_) => {
            tracing::info!(%conn_id, "no match request before timeout");
            let _ = conn.close().await;
            return Err(PairforgeError::Protocol(ProtocolError::InvalidMessage(
                "match request timed out".into(),
            )));
        }
    }

    let player = PlayerId::generate();
    tracing::info!(%conn_id, %player, "match requested");

    // --- Step 2: Rendezvous ---
    let outcome = tokio::select! {
        result = state.client.request_match(&player, &shutdown) => Some(result),
        _ = wait_for_close(&conn) => None,
    };

    let result = match outcome {
        Some(Ok(result)) => result,
        None => {
            tracing::info!(%conn_id, %player, "client left before a match was found");
            if state.withdraw_on_disconnect {
                state.coordinator.withdraw(&player);
            }
            return Ok(());
        }
        Some(Err(RendezvousError::Cancelled | RendezvousError::SubscriptionClosed)) => {
            tracing::debug!(%conn_id, %player, "server shutting down, closing connection");
            let _ = conn.close().await;
            return Ok(());
        }
        Some(Err(e)) => {
            let _ = conn.close().await;
            return Err(e.into());
        }
    };

    // --- Step 3: Reply ---
    match conn.send_text(&result.endpoint).await {
        Ok(()) => {}
        Err(TransportError::ConnectionClosed(_)) => {
            tracing::info!(%conn_id, %player, "client left before the endpoint was delivered");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(%conn_id, %player, endpoint = %result.endpoint, "endpoint sent");
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close after reply failed");
    }
    Ok(())
}

/// Resolves once the client closes the connection or it fails. Further
/// messages from the client are ignored.
async fn wait_for_close(conn: &WebSocketConnection) {
    loop {
        match conn.recv().await {
            Ok(Some(_)) => continue,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!(conn_id = %conn.id(), error = %e, "recv error while waiting for a match");
                return;
            }
        }
    }
}
