//! The relay pipeline: receive, validate, broadcast.
//!
//! Every frame from every publisher goes through one [`RelayCore`] loop,
//! so frames are broadcast in exactly the order they were received. Fan-out
//! goes through a [`Broadcaster`], which never waits for subscribers.

use std::sync::Arc;

use chanrelay_protocol::{Codec, LineCodec};
use tokio::sync::{broadcast, mpsc};

/// A frame as handed to subscribers. Shared, never copied per subscriber.
pub type Frame = Arc<[u8]>;

/// Depth of the queue between publisher connections and the core loop.
pub const INGRESS_QUEUE_CAPACITY: usize = 1024;

/// Frames a slow subscriber may fall behind before it starts losing them.
pub const BROADCAST_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Broadcaster
// ---------------------------------------------------------------------------

/// Fire-and-forget fan-out to every connected subscriber.
///
/// Cloning gives another handle to the same fan-out.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<Frame>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Sends `frame` to every current subscriber and returns how many
    /// there were. Having none is not an error.
    pub fn publish(&self, frame: &[u8]) -> usize {
        self.sender.send(Arc::from(frame)).unwrap_or(0)
    }

    /// Registers a new subscriber. It sees frames published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.sender.subscribe()
    }

    /// Number of subscribers currently registered.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(BROADCAST_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// RelayCore
// ---------------------------------------------------------------------------

/// The sequential receive → validate → broadcast loop.
pub struct RelayCore<C: Codec = LineCodec> {
    codec: C,
    inbox: mpsc::Receiver<Vec<u8>>,
    broadcaster: Broadcaster,
    verbose: bool,
}

impl<C: Codec> RelayCore<C> {
    pub fn new(
        codec: C,
        inbox: mpsc::Receiver<Vec<u8>>,
        broadcaster: Broadcaster,
        verbose: bool,
    ) -> Self {
        Self {
            codec,
            inbox,
            broadcaster,
            verbose,
        }
    }

    /// Waits for the next frame from any publisher.
    ///
    /// Returns `None` once every publisher handle is gone.
    pub async fn receive(&mut self) -> Option<Vec<u8>> {
        self.inbox.recv().await
    }

    /// Decides whether a frame is relayed.
    ///
    /// A frame passes when it decodes to a message with non-blank content.
    /// The returned slice is the frame itself, untouched: the relay never
    /// re-encodes what it forwards.
    pub fn validate<'a>(&self, raw: &'a [u8]) -> Option<&'a [u8]> {
        self.codec.decode(raw).content().map(|_| raw)
    }

    /// Fans a validated frame out to every subscriber.
    pub fn broadcast(&self, frame: &[u8]) -> usize {
        let reached = self.broadcaster.publish(frame);
        self.log_frame("message_published", frame);
        tracing::trace!(subscribers = reached, "broadcast complete");
        reached
    }

    /// Runs one frame through validation and, if it passes, broadcast.
    ///
    /// Returns `true` if the frame was broadcast.
    pub fn relay(&self, raw: &[u8]) -> bool {
        self.log_frame("message_received", raw);
        match self.validate(raw) {
            Some(frame) => {
                self.broadcast(frame);
                true
            }
            None => {
                tracing::trace!(
                    event = "message_dropped",
                    bytes = raw.len(),
                    "dropping frame without content"
                );
                false
            }
        }
    }

    /// Relays frames until the inbox closes.
    pub async fn run(mut self) {
        while let Some(raw) = self.receive().await {
            self.relay(&raw);
        }
    }

    fn log_frame(&self, event: &'static str, frame: &[u8]) {
        let line = String::from_utf8_lossy(frame);
        let line = line.trim();
        if self.verbose {
            tracing::info!(event, bytes = frame.len(), line, "relay");
        } else {
            tracing::debug!(event, bytes = frame.len(), line, "relay");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay_core() -> (mpsc::Sender<Vec<u8>>, RelayCore, Broadcaster) {
        let (tx, rx) = mpsc::channel(16);
        let broadcaster = Broadcaster::new(16);
        let core = RelayCore::new(LineCodec, rx, broadcaster.clone(), false);
        (tx, core, broadcaster)
    }

    // =====================================================================
    // Validation
    // =====================================================================

    #[test]
    fn test_validate_accepts_well_formed_frame() {
        let (_tx, core, _) = relay_core();
        let raw = b"[GLOBAL] alice: Hello";
        assert_eq!(core.validate(raw), Some(&raw[..]));
    }

    #[test]
    fn test_validate_returns_frame_unchanged() {
        let (_tx, core, _) = relay_core();
        let raw = b"  [GLOBAL]   alice:   spaced out  \n";
        assert_eq!(core.validate(raw), Some(&raw[..]));
    }

    #[test]
    fn test_validate_drops_unparseable_frames() {
        let (_tx, core, _) = relay_core();
        for raw in [&b"garbage"[..], b"", b"[GLOBAL] no username here", b"\xff\xfe"] {
            assert_eq!(core.validate(raw), None);
        }
    }

    #[test]
    fn test_validate_drops_blank_content() {
        let (_tx, core, _) = relay_core();
        assert_eq!(core.validate(b"[GLOBAL] alice:"), None);
        assert_eq!(core.validate(b"[GLOBAL] alice:   \t "), None);
    }

    // =====================================================================
    // Broadcast
    // =====================================================================

    #[test]
    fn test_broadcast_without_subscribers_is_fine() {
        let (_tx, core, _) = relay_core();
        assert_eq!(core.broadcast(b"[GLOBAL] alice: anyone?"), 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let (_tx, core, broadcaster) = relay_core();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        assert_eq!(core.broadcast(b"[GLOBAL] alice: hi"), 2);
        assert_eq!(&*first.recv().await.unwrap(), b"[GLOBAL] alice: hi");
        assert_eq!(&*second.recv().await.unwrap(), b"[GLOBAL] alice: hi");
    }

    #[tokio::test]
    async fn test_subscriber_misses_earlier_frames() {
        let (_tx, core, broadcaster) = relay_core();
        core.broadcast(b"[GLOBAL] alice: early");
        let mut late = broadcaster.subscribe();
        core.broadcast(b"[GLOBAL] alice: late");
        assert_eq!(&*late.recv().await.unwrap(), b"[GLOBAL] alice: late");
    }

    // =====================================================================
    // Loop
    // =====================================================================

    #[tokio::test]
    async fn test_run_relays_valid_frames_in_order() {
        let (tx, core, broadcaster) = relay_core();
        let mut sub = broadcaster.subscribe();

        for raw in [
            &b"[GLOBAL] a: one"[..],
            b"garbage",
            b"[OTHER] b: two",
            b"[GLOBAL] c:   ",
            b"[GLOBAL] d: three",
        ] {
            tx.send(raw.to_vec()).await.unwrap();
        }
        drop(tx);
        core.run().await;

        assert_eq!(&*sub.recv().await.unwrap(), b"[GLOBAL] a: one");
        assert_eq!(&*sub.recv().await.unwrap(), b"[OTHER] b: two");
        assert_eq!(&*sub.recv().await.unwrap(), b"[GLOBAL] d: three");
        assert!(sub.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_reports_outcome() {
        let (_tx, core, _) = relay_core();
        assert!(core.relay(b"[GLOBAL] a: ok"));
        assert!(!core.relay(b"nope"));
    }
}
