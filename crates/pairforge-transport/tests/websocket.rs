//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it with
//! a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use pairforge_transport::{
        Connection, Transport, TransportError, WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on a random port, connects one client and returns both ends.
    async fn connected_pair() -> (WebSocketTransport, WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();

        let client = tokio::spawn(async move {
            let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");
            ws
        });
        let server_conn = transport.accept().await.expect("should accept");
        let client_ws = client.await.expect("client task");
        (transport, server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_websocket_request_received_as_opaque_bytes() {
        let (_transport, server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::text("find me a match")).await.unwrap();
        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, b"find me a match");

        client_ws
            .send(Message::Binary(b"ready".to_vec().into()))
            .await
            .unwrap();
        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, b"ready");
    }

    #[tokio::test]
    async fn test_websocket_connections_get_distinct_ids() {
        let (mut transport, first, _a) = connected_pair().await;
        let addr = transport.local_addr().unwrap().to_string();
        let client = tokio::spawn(async move {
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .unwrap()
        });
        let second = transport.accept().await.unwrap();
        let _b = client.await.unwrap();

        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_websocket_send_text_arrives_as_text_frame() {
        let (_transport, server_conn, mut client_ws) = connected_pair().await;

        server_conn
            .send_text("http://10.0.0.5:7777")
            .await
            .expect("send_text should succeed");

        match client_ws.next().await.unwrap().unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), "http://10.0.0.5:7777"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending() {
        let (_transport, server_conn, mut client_ws) = connected_pair().await;
        let server_conn = Arc::new(server_conn);

        let watcher = tokio::spawn({
            let conn = Arc::clone(&server_conn);
            async move { conn.recv().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), server_conn.send_text("http://a:1"))
            .await
            .expect("send must not wait for recv")
            .unwrap();
        let reply = client_ws.next().await.unwrap().unwrap();
        assert_eq!(reply.to_text().unwrap(), "http://a:1");

        client_ws.send(Message::Close(None)).await.unwrap();
        assert!(watcher.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (_transport, server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_send_text_after_client_close_is_connection_closed() {
        let (_transport, server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();
        assert!(server_conn.recv().await.unwrap().is_none());

        let err = server_conn.send_text("http://a:1").await.unwrap_err();
        assert!(
            matches!(err, TransportError::ConnectionClosed(id) if id == server_conn.id()),
            "{err:?}"
        );
        server_conn.close().await.expect("closing a closed connection is fine");
    }

    #[tokio::test]
    async fn test_websocket_bind_invalid_address_fails() {
        let result = WebSocketTransport::bind("not an address").await;
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }
}
