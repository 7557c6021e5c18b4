//! Unified error type for chanrelay.

use chanrelay_protocol::ProtocolError;
use chanrelay_transport::TransportError;

/// Top-level error wrapping the sub-crate errors.
///
/// The `#[from]` variants let `?` lift transport and protocol failures
/// straight out of the relay and client loops.
#[derive(Debug, thiserror::Error)]
pub enum ChanrelayError {
    /// Binding, connecting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A username or channel name was rejected.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Local I/O failed: reading user input, writing output, opening the
    /// log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A client loop task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
