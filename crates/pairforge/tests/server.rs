//! Integration tests for the Pairforge server: real WebSocket clients
//! against a server bound to an OS-assigned port.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pairforge::prelude::*;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

const ENDPOINT: &str = "http://10.0.0.5:7777";

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct Running {
    addr: String,
    coordinator: Coordinator<MemoryBus, StaticAllocator>,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), PairforgeError>>,
}

async fn start_server(builder: PairforgeServerBuilder) -> Running {
    let server = builder
        .bind("127.0.0.1:0")
        .build(StaticAllocator::new(ENDPOINT))
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let coordinator = server.coordinator().clone();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(server.run(shutdown.clone()));

    Running {
        addr,
        coordinator,
        shutdown,
        task,
    }
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

/// Connects and sends the match request.
async fn request_match(addr: &str) -> ClientWs {
    let mut ws = connect(addr).await;
    ws.send(Message::text("find me a match"))
        .await
        .expect("send request");
    ws
}

/// Reads the endpoint text frame.
async fn read_endpoint(ws: &mut ClientWs) -> String {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("reply within timeout")
        .expect("stream open")
        .expect("valid frame");
    assert!(msg.is_text(), "expected a text frame, got {msg:?}");
    msg.to_text().expect("utf-8").to_string()
}

/// Asserts the server closes the connection without sending data.
async fn expect_closed(ws: &mut ClientWs) {
    let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("close within timeout");
    match next {
        None | Some(Ok(Message::Close(_))) | Some(Err(_)) => {}
        Some(Ok(other)) => panic!("expected close, got {other:?}"),
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition within timeout");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_two_clients_receive_same_endpoint() {
    let server = start_server(PairforgeServerBuilder::new()).await;

    let mut a = request_match(&server.addr).await;
    let mut b = request_match(&server.addr).await;

    assert_eq!(read_endpoint(&mut a).await, ENDPOINT);
    assert_eq!(read_endpoint(&mut b).await, ENDPOINT);
    expect_closed(&mut a).await;
    expect_closed(&mut b).await;

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_single_client_waits() {
    let server = start_server(PairforgeServerBuilder::new()).await;

    let mut a = request_match(&server.addr).await;
    wait_until(|| server.coordinator.waiting().is_some()).await;

    let next = tokio::time::timeout(Duration::from_millis(200), a.next()).await;
    assert!(next.is_err(), "no reply without an opponent");

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_disconnected_player_stays_waiting_by_default() {
    let server = start_server(PairforgeServerBuilder::new()).await;

    let mut a = request_match(&server.addr).await;
    wait_until(|| server.coordinator.waiting().is_some()).await;
    let waiting = server.coordinator.waiting();

    a.close(None).await.expect("client close");
    drop(a);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.coordinator.waiting(), waiting);

    // The next arrival is paired with the departed player.
    let mut b = request_match(&server.addr).await;
    assert_eq!(read_endpoint(&mut b).await, ENDPOINT);
    assert_eq!(server.coordinator.waiting(), None);

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_withdraw_on_disconnect_frees_slot() {
    let server = start_server(PairforgeServerBuilder::new().withdraw_on_disconnect(true)).await;

    let mut a = request_match(&server.addr).await;
    wait_until(|| server.coordinator.waiting().is_some()).await;

    a.close(None).await.expect("client close");
    drop(a);
    wait_until(|| server.coordinator.waiting().is_none()).await;

    let mut b = request_match(&server.addr).await;
    let mut c = request_match(&server.addr).await;
    assert_eq!(read_endpoint(&mut b).await, ENDPOINT);
    assert_eq!(read_endpoint(&mut c).await, ENDPOINT);

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_silent_client_is_closed_after_request_timeout() {
    let server = start_server(
        PairforgeServerBuilder::new().request_timeout(Duration::from_millis(100)),
    )
    .await;

    let mut a = connect(&server.addr).await;
    expect_closed(&mut a).await;
    assert_eq!(server.coordinator.waiting(), None);

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_waiting_connections() {
    let server = start_server(PairforgeServerBuilder::new()).await;

    let mut a = request_match(&server.addr).await;
    wait_until(|| server.coordinator.waiting().is_some()).await;

    server.shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("run returns promptly")
        .unwrap()
        .unwrap();

    expect_closed(&mut a).await;
}

#[tokio::test]
async fn test_build_on_bad_address_fails() {
    let result = PairforgeServerBuilder::new()
        .bind("not an address")
        .build(StaticAllocator::new(ENDPOINT))
        .await;
    assert!(matches!(result, Err(PairforgeError::Transport(_))));
}
