//! The chat client: two independent loops over two relay connections.
//!
//! The outbound loop reads lines from the user and publishes them on the
//! ingress connection. The inbound loop reads the broadcast connection,
//! keeps frames for the client's channel and writes them out. They run as
//! separate tasks, so typing never waits on incoming traffic and the
//! reverse.

use std::future::Future;
use std::sync::Arc;

use chanrelay_protocol::{
    ChannelName, ChannelSubscription, ChatMessage, Codec, LineCodec, Username,
};
use chanrelay_transport::{Connection, TransportError, WebSocketConnection};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinError;

use crate::config::ClientConfig;
use crate::render::{render, RenderStyle};
use crate::ChanrelayError;

/// A client connected to both relay endpoints.
pub struct ChatClient<C: Codec = LineCodec> {
    config: ClientConfig,
    codec: Arc<C>,
    ingress: Arc<WebSocketConnection>,
    broadcast: Arc<WebSocketConnection>,
}

impl ChatClient<LineCodec> {
    /// Connects with the line codec.
    pub async fn connect(config: ClientConfig) -> Result<Self, ChanrelayError> {
        Self::connect_with_codec(config, LineCodec).await
    }
}

impl<C: Codec> ChatClient<C> {
    /// Opens the broadcast connection, then the ingress connection.
    ///
    /// The relay registers a subscriber before it answers the broadcast
    /// handshake, so once this returns every frame the relay accepts from
    /// then on reaches this client.
    ///
    /// # Errors
    /// Returns [`ChanrelayError::Transport`] if either endpoint refuses.
    pub async fn connect_with_codec(config: ClientConfig, codec: C) -> Result<Self, ChanrelayError> {
        let endpoint = config.endpoint();
        let broadcast = WebSocketConnection::connect(&endpoint.broadcast_url()).await?;
        let ingress = WebSocketConnection::connect(&endpoint.ingress_url()).await?;

        tracing::info!(
            event = "client_connected",
            host = %endpoint.host,
            ingress_port = endpoint.ingress_port,
            broadcast_port = endpoint.broadcast_port,
            channel = %config.channel(),
            username = %config.username(),
            "connected to relay"
        );

        Ok(Self {
            config,
            codec: Arc::new(codec),
            ingress: Arc::new(ingress),
            broadcast: Arc::new(broadcast),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs both loops until `shutdown` completes or the relay closes the
    /// broadcast stream.
    ///
    /// End of `input` stops only the outbound loop; incoming messages keep
    /// arriving on `output`. Both connections are closed before returning.
    ///
    /// # Errors
    /// The first I/O or transport failure from either loop.
    pub async fn run_until<R, W, F>(self, input: R, output: W, shutdown: F) -> Result<(), ChanrelayError>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        F: Future<Output = ()>,
    {
        let ChatClient {
            config,
            codec,
            ingress,
            broadcast,
        } = self;

        let mut outbound = tokio::spawn({
            let conn = Arc::clone(&ingress);
            let codec = Arc::clone(&codec);
            let channel = config.channel().clone();
            let username = config.username().clone();
            let mut input = input;
            async move { outbound_loop(&*conn, &*codec, &channel, &username, &mut input).await }
        });

        let mut inbound = tokio::spawn({
            let conn = Arc::clone(&broadcast);
            let subscription = ChannelSubscription::new(config.channel());
            let style = config.render();
            let mut output = output;
            async move { inbound_loop(&*conn, &*codec, &subscription, style, &mut output).await }
        });

        tokio::pin!(shutdown);
        let mut input_open = true;

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(event = "session_interrupted", "client shutting down");
                    break Ok(());
                }
                finished = &mut outbound, if input_open => {
                    input_open = false;
                    if let Err(e) = flatten(finished) {
                        break Err(e);
                    }
                    tracing::info!(event = "input_closed", "input closed; still receiving");
                }
                finished = &mut inbound => {
                    if finished.as_ref().is_ok_and(Result::is_ok) {
                        tracing::info!(event = "broadcast_closed", "relay closed the broadcast stream");
                    }
                    break flatten(finished);
                }
            }
        };

        outbound.abort();
        inbound.abort();
        close_quietly(&*ingress).await;
        close_quietly(&*broadcast).await;
        result
    }
}

/// Publishes each non-blank input line until end of input.
///
/// Lines are read as bytes; invalid UTF-8 is replaced, not rejected.
pub(crate) async fn outbound_loop<T, C, R>(
    conn: &T,
    codec: &C,
    channel: &ChannelName,
    username: &Username,
    input: &mut R,
) -> Result<(), ChanrelayError>
where
    T: Connection<Error = TransportError>,
    C: Codec,
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        // Bytes that are not UTF-8 become U+FFFD instead of ending the session.
        let line = String::from_utf8_lossy(&buf);
        let Some(message) = ChatMessage::new(channel.clone(), username.clone(), &line) else {
            continue;
        };
        let frame = codec.encode(&message);
        conn.send(&frame).await?;
        tracing::debug!(
            event = "message_sent",
            channel = %channel,
            username = %username,
            bytes = frame.len(),
            "sent message"
        );
    }
}

/// Writes every broadcast frame for the subscribed channel to `output`,
/// one line each, until the connection closes.
pub(crate) async fn inbound_loop<T, C, W>(
    conn: &T,
    codec: &C,
    subscription: &ChannelSubscription,
    style: RenderStyle,
    output: &mut W,
) -> Result<(), ChanrelayError>
where
    T: Connection<Error = TransportError>,
    C: Codec,
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = conn.recv().await? {
        if !subscription.matches(&frame) {
            continue;
        }
        let mut line = render(&codec.decode(&frame), style);
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}

fn flatten(joined: Result<Result<(), ChanrelayError>, JoinError>) -> Result<(), ChanrelayError> {
    joined?
}

async fn close_quietly<T: Connection>(conn: &T) {
    if let Err(e) = conn.close().await {
        tracing::debug!(conn_id = %conn.id(), error = %e, "close failed");
    }
}
