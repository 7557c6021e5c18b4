//! Integration tests for the WebSocket transport.
//!
//! These tests bind a real listener on an ephemeral port and connect to it
//! with the transport's own client side, so frames cross an actual socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use chanrelay_transport::{
        Connection, Transport, TransportError, WebSocketConnection,
        WebSocketTransport,
    };
    use tokio::net::TcpStream;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    /// Binds on port 0 and returns the transport with its `ws://` URL.
    async fn bind_ephemeral() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");
        (transport, format!("ws://{addr}"))
    }

    /// Accepts one connection in the background while `url` is dialled.
    async fn connect_pair(
        mut transport: WebSocketTransport,
        url: &str,
    ) -> (WebSocketConnection, WebSocketConnection) {
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = WebSocketConnection::connect(url)
            .await
            .expect("client should connect");
        let server = server_handle.await.expect("task should complete");
        (server, client)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (transport, url) = bind_ephemeral().await;
        let (server_conn, client_conn) = connect_pair(transport, &url).await;

        assert!(server_conn.id().into_inner() > 0);
        assert_ne!(server_conn.id(), client_conn.id());
        assert!(server_conn.peer_addr().is_some());
        assert!(client_conn.peer_addr().is_none());

        // Server sends, client receives.
        server_conn
            .send(b"[GLOBAL] relay: hello")
            .await
            .expect("send should succeed");
        let received = timeout(WAIT, client_conn.recv())
            .await
            .expect("recv should not time out")
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"[GLOBAL] relay: hello");

        // Client sends, server receives.
        client_conn
            .send(b"[GLOBAL] alice: hi")
            .await
            .expect("send should succeed");
        let received = timeout(WAIT, server_conn.recv())
            .await
            .expect("recv should not time out")
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"[GLOBAL] alice: hi");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_frames_keep_send_order() {
        let (transport, url) = bind_ephemeral().await;
        let (server_conn, client_conn) = connect_pair(transport, &url).await;

        for frame in [&b"A"[..], b"B", b"C"] {
            client_conn.send(frame).await.expect("send");
        }

        let mut got = Vec::new();
        for _ in 0..3 {
            let frame = timeout(WAIT, server_conn.recv())
                .await
                .expect("no timeout")
                .expect("recv")
                .expect("frame");
            got.push(frame);
        }
        assert_eq!(got, vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()]);
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_peer_close() {
        let (transport, url) = bind_ephemeral().await;
        let (server_conn, client_conn) = connect_pair(transport, &url).await;

        client_conn.close().await.expect("close should succeed");

        let result = timeout(WAIT, server_conn.recv())
            .await
            .expect("recv should not time out")
            .expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_recv_while_sending_from_other_task() {
        // A task parked in recv() must not block sends on the same
        // connection.
        let (transport, url) = bind_ephemeral().await;
        let (server_conn, client_conn) = connect_pair(transport, &url).await;
        let client_conn = std::sync::Arc::new(client_conn);

        let reader = {
            let client_conn = std::sync::Arc::clone(&client_conn);
            tokio::spawn(async move { client_conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        timeout(WAIT, client_conn.send(b"outbound"))
            .await
            .expect("send must not wait for the reader")
            .expect("send");
        let frame = timeout(WAIT, server_conn.recv())
            .await
            .expect("no timeout")
            .expect("recv")
            .expect("frame");
        assert_eq!(frame, b"outbound");

        server_conn.send(b"inbound").await.expect("send");
        let echoed = timeout(WAIT, reader)
            .await
            .expect("no timeout")
            .expect("join")
            .expect("recv")
            .expect("frame");
        assert_eq!(echoed, b"inbound");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let (transport, url) = bind_ephemeral().await;
        drop(transport);

        let err = WebSocketConnection::connect(&url)
            .await
            .err()
            .expect("connect should fail");
        assert!(matches!(err, TransportError::ConnectFailed { .. }));
    }

    // =====================================================================
    // Socket accept and upgrade
    // =====================================================================

    #[tokio::test]
    async fn test_idle_socket_does_not_block_next_accept() {
        let (mut transport, url) = bind_ephemeral().await;
        let addr = transport.local_addr().expect("local addr");

        // Connects but never sends an upgrade request.
        let _idle = TcpStream::connect(addr).await.expect("tcp connect");
        let idle_pending = timeout(WAIT, transport.accept_socket())
            .await
            .expect("accept_socket should not wait for a handshake")
            .expect("accept");

        let client = tokio::spawn(async move {
            WebSocketConnection::connect(&url).await
        });
        let pending = timeout(WAIT, transport.accept_socket())
            .await
            .expect("second accept should not wait on the idle peer")
            .expect("accept");
        let server_conn = timeout(WAIT, pending.upgrade())
            .await
            .expect("no timeout")
            .expect("upgrade");
        let client_conn = client.await.expect("join").expect("connect");

        client_conn.send(b"through").await.expect("send");
        let frame = timeout(WAIT, server_conn.recv())
            .await
            .expect("no timeout")
            .expect("recv")
            .expect("frame");
        assert_eq!(frame, b"through");
        drop(idle_pending);
    }

    #[tokio::test]
    async fn test_upgrade_gives_up_on_silent_peer() {
        let (mut transport, _url) = bind_ephemeral().await;
        let addr = transport.local_addr().expect("local addr");

        let _idle = TcpStream::connect(addr).await.expect("tcp connect");
        let pending = transport.accept_socket().await.expect("accept");
        assert_eq!(pending.peer_addr().ip(), addr.ip());

        let err = timeout(WAIT, pending.upgrade_within(Duration::from_millis(100)))
            .await
            .expect("upgrade should give up on its own")
            .err()
            .expect("upgrade should fail");
        assert!(matches!(
            err,
            TransportError::AcceptFailed(ref e) if e.kind() == std::io::ErrorKind::TimedOut
        ));
    }
}
