//! # chanrelay
//!
//! Channel-tagged chat over a central relay.
//!
//! Clients publish `[CHANNEL] username: content` lines to the relay's
//! ingress endpoint. The relay drops lines without content and republishes
//! the rest, unchanged and in arrival order, to everyone connected to its
//! broadcast endpoint. Each client keeps only the lines tagged with its own
//! channel.
//!
//! ```text
//! ChatClient ──► ingress ──► RelayCore ──► broadcast ──► ChatClient (filters by [CHANNEL])
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chanrelay::prelude::*;
//!
//! # async fn chat() -> Result<(), ChanrelayError> {
//! let config = ClientConfig::builder()
//!     .channel("general")
//!     .username("alice")
//!     .build()?;
//! let client = ChatClient::connect(config).await?;
//! let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//! client
//!     .run_until(stdin, tokio::io::stdout(), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! # }
//! ```

pub mod client;
pub mod config;
mod error;
mod handler;
pub mod logging;
pub mod pipeline;
pub mod relay;
pub mod render;

pub use error::ChanrelayError;

/// Everything needed to run a relay or a client.
pub mod prelude {
    pub use crate::client::ChatClient;
    pub use crate::config::{ClientConfig, ClientConfigBuilder, EndpointConfig, RelayConfig};
    pub use crate::logging::{init_logging, LogConfig};
    pub use crate::pipeline::{Broadcaster, RelayCore};
    pub use crate::relay::Relay;
    pub use crate::render::RenderStyle;
    pub use crate::ChanrelayError;

    pub use chanrelay_protocol::{
        validate_channel, validate_username, ChannelName, ChannelSubscription, ChatMessage,
        Codec, Decoded, LineCodec, ProtocolError, Username,
    };
    pub use chanrelay_transport::TransportError;
}
