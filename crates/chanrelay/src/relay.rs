//! The relay server: two endpoints around one [`RelayCore`].
//!
//! ```text
//! publishers ──► ingress ──► queue ──► RelayCore ──► Broadcaster ──► broadcast ──► subscribers
//! ```
//!
//! The relay never looks at channels. Subscribers get every frame and
//! filter on their side.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use chanrelay_protocol::{Codec, LineCodec};
use chanrelay_transport::{TransportError, WebSocketTransport};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::RelayConfig;
use crate::handler::{feed_subscriber, forward_publisher};
use crate::pipeline::{Broadcaster, RelayCore, INGRESS_QUEUE_CAPACITY};
use crate::ChanrelayError;

/// Pause after a failed accept, so a persistent listener error such as
/// running out of file descriptors does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound relay, ready to run.
///
/// # Example
///
/// ```rust,no_run
/// use chanrelay::prelude::*;
///
/// # async fn start() -> Result<(), ChanrelayError> {
/// let relay = Relay::bind(RelayConfig::default()).await?;
/// relay.run_until_ctrl_c().await;
/// # Ok(())
/// # }
/// ```
pub struct Relay<C: Codec = LineCodec> {
    ingress: WebSocketTransport,
    broadcast: WebSocketTransport,
    broadcaster: Broadcaster,
    codec: C,
    config: RelayConfig,
}

impl Relay<LineCodec> {
    /// Binds both endpoints with the line codec.
    pub async fn bind(config: RelayConfig) -> Result<Self, ChanrelayError> {
        Self::bind_with_codec(config, LineCodec).await
    }
}

impl<C: Codec> Relay<C> {
    /// Binds the ingress endpoint, then the broadcast endpoint.
    ///
    /// # Errors
    /// Returns [`ChanrelayError::Transport`] if either address is in use
    /// or cannot be bound.
    pub async fn bind_with_codec(config: RelayConfig, codec: C) -> Result<Self, ChanrelayError> {
        let ingress = WebSocketTransport::bind(&config.endpoint.ingress_addr()).await?;
        let broadcast = WebSocketTransport::bind(&config.endpoint.broadcast_addr()).await?;

        Ok(Self {
            ingress,
            broadcast,
            broadcaster: Broadcaster::default(),
            codec,
            config,
        })
    }

    pub fn ingress_addr(&self) -> std::io::Result<SocketAddr> {
        self.ingress.local_addr()
    }

    pub fn broadcast_addr(&self) -> std::io::Result<SocketAddr> {
        self.broadcast.local_addr()
    }

    /// A handle to the relay's fan-out, usable after the relay starts.
    pub fn broadcaster(&self) -> Broadcaster {
        self.broadcaster.clone()
    }

    /// Serves until `shutdown` completes.
    ///
    /// Connections still open at that point are dropped.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let Relay {
            ingress,
            broadcast,
            broadcaster,
            codec,
            config,
        } = self;

        let (inbox_tx, inbox_rx) = mpsc::channel(INGRESS_QUEUE_CAPACITY);
        let ingress_task = tokio::spawn(accept_publishers(ingress, inbox_tx));
        let broadcast_task = tokio::spawn(accept_subscribers(broadcast, broadcaster.clone()));
        let core = RelayCore::new(codec, inbox_rx, broadcaster, config.verbose);

        tracing::info!(
            event = "relay_started",
            host = %config.endpoint.host,
            ingress_port = config.endpoint.ingress_port,
            broadcast_port = config.endpoint.broadcast_port,
            "relay running"
        );

        tokio::select! {
            _ = shutdown => {
                tracing::info!(event = "relay_stopped", "relay shutting down");
            }
            _ = core.run() => {
                tracing::warn!(event = "relay_stopped", "ingress queue closed");
            }
        }

        ingress_task.abort();
        broadcast_task.abort();
    }

    /// Serves until Ctrl-C.
    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }
}

async fn accept_publishers(mut transport: WebSocketTransport, inbox: mpsc::Sender<Vec<u8>>) {
    // Dropping the set when this task is aborted drops every connection.
    let mut connections = JoinSet::new();
    loop {
        match transport.accept_socket().await {
            Ok(pending) => {
                let inbox = inbox.clone();
                connections.spawn(async move {
                    let peer = pending.peer_addr();
                    match pending.upgrade().await {
                        Ok(conn) => forward_publisher(conn, inbox).await,
                        Err(e) => tracing::debug!(%peer, error = %e, "ingress handshake failed"),
                    }
                });
            }
            Err(e) => back_off("ingress", &e).await,
        }
        while connections.try_join_next().is_some() {}
    }
}

async fn accept_subscribers(mut transport: WebSocketTransport, broadcaster: Broadcaster) {
    let mut connections = JoinSet::new();
    loop {
        match transport.accept_socket().await {
            Ok(pending) => {
                // Registered before the handshake completes, so a client
                // whose connect has returned never misses a frame.
                let feed = broadcaster.subscribe();
                connections.spawn(async move {
                    let peer = pending.peer_addr();
                    match pending.upgrade().await {
                        Ok(conn) => feed_subscriber(conn, feed).await,
                        Err(e) => tracing::debug!(%peer, error = %e, "broadcast handshake failed"),
                    }
                });
            }
            Err(e) => back_off("broadcast", &e).await,
        }
        while connections.try_join_next().is_some() {}
    }
}

async fn back_off(endpoint: &'static str, error: &TransportError) {
    tracing::warn!(endpoint, %error, "accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}
