//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Every frame travels as one binary WebSocket message. Incoming text
//! messages are accepted too and handed up as their UTF-8 bytes.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// How long an accepted socket has to complete the WebSocket upgrade.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Server-side and client-side streams share one type so a
/// [`WebSocketConnection`] looks the same from either end.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            TransportError::BindFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Accepts the next TCP connection without upgrading it.
    ///
    /// Returns as soon as the socket is accepted, so a peer that never
    /// sends a handshake cannot hold up the listener.
    pub async fn accept_socket(&mut self) -> Result<PendingUpgrade, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        Ok(PendingUpgrade { stream, addr })
    }

    /// Returns the address the listener is actually bound to.
    ///
    /// Useful when binding to port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Accepts a socket and upgrades it in place.
    ///
    /// The listener is held for the whole handshake. Servers with many
    /// peers should use [`accept_socket`](WebSocketTransport::accept_socket)
    /// and upgrade on a separate task instead.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        self.accept_socket().await?.upgrade().await
    }
}

/// A TCP connection that has not yet completed the WebSocket upgrade.
#[derive(Debug)]
pub struct PendingUpgrade {
    stream: TcpStream,
    addr: SocketAddr,
}

impl PendingUpgrade {
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the server side of the handshake, giving up after
    /// [`HANDSHAKE_TIMEOUT`].
    pub async fn upgrade(self) -> Result<WebSocketConnection, TransportError> {
        self.upgrade_within(HANDSHAKE_TIMEOUT).await
    }

    /// Runs the server side of the handshake, giving up after `limit`.
    pub async fn upgrade_within(
        self,
        limit: Duration,
    ) -> Result<WebSocketConnection, TransportError> {
        let addr = self.addr;
        let handshake =
            tokio_tungstenite::accept_async(MaybeTlsStream::Plain(self.stream));

        let ws = match tokio::time::timeout(limit, handshake).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => {
                return Err(TransportError::AcceptFailed(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    e,
                )));
            }
            Err(_) => {
                return Err(TransportError::AcceptFailed(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no WebSocket handshake from {addr}"),
                )));
            }
        };

        let conn = WebSocketConnection::from_stream(ws, Some(addr));
        tracing::debug!(id = %conn.id, %addr, "accepted WebSocket connection");
        Ok(conn)
    }
}

/// A single WebSocket connection.
///
/// The stream is split so one task can block in [`recv`](Connection::recv)
/// while another sends.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// Opens an outbound connection to a `ws://host:port` URL.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _response) =
            tokio_tungstenite::connect_async(url).await.map_err(|e| {
                TransportError::ConnectFailed {
                    url: url.to_string(),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, e),
                }
            })?;

        let conn = Self::from_stream(ws, None);
        tracing::debug!(id = %conn.id, url, "opened WebSocket connection");
        Ok(conn)
    }

    /// Remote address, known only for connections accepted by a listener.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn from_stream(ws: WsStream, peer: Option<SocketAddr>) -> Self {
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (sink, stream) = ws.split();
        Self {
            id,
            peer,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.to_vec()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(
                    tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::AlreadyClosed,
                )) => return Ok(None),
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self.sink.lock().await.close().await {
            Ok(())
            | Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed,
            ) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
