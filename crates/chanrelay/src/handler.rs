//! Per-connection tasks on the relay's two endpoints.
//!
//! Each accepted connection gets its own Tokio task:
//!   - ingress: read frames and push them onto the core's queue
//!   - broadcast: write every broadcast frame to the subscriber

use chanrelay_transport::{Connection, WebSocketConnection};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use crate::pipeline::Frame;

/// Forwards every frame a publisher sends to the relay core.
///
/// Ends when the publisher disconnects or the core stops.
pub(crate) async fn forward_publisher(conn: WebSocketConnection, inbox: mpsc::Sender<Vec<u8>>) {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = ?conn.peer_addr(), "publisher connected");

    loop {
        match conn.recv().await {
            Ok(Some(frame)) => {
                if inbox.send(frame).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(%conn_id, "publisher disconnected");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "publisher connection failed");
                break;
            }
        }
    }
}

/// Streams broadcast frames to one subscriber.
///
/// The subscriber is not expected to send anything; frames it does send
/// are ignored. A subscriber that falls too far behind loses the frames it
/// missed and keeps receiving from there.
pub(crate) async fn feed_subscriber(conn: WebSocketConnection, mut feed: broadcast::Receiver<Frame>) {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = ?conn.peer_addr(), "subscriber connected");

    loop {
        tokio::select! {
            frame = feed.recv() => match frame {
                Ok(frame) => {
                    if let Err(e) = conn.send(&frame).await {
                        tracing::debug!(%conn_id, error = %e, "subscriber send failed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%conn_id, skipped, "subscriber lagged; frames dropped");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = conn.recv() => match inbound {
                Ok(Some(_)) => tracing::trace!(%conn_id, "ignoring frame from subscriber"),
                Ok(None) => {
                    tracing::debug!(%conn_id, "subscriber disconnected");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "subscriber connection failed");
                    break;
                }
            },
        }
    }

    let _ = conn.close().await;
}
