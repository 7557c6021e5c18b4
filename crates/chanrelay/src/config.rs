//! Relay and client configuration.
//!
//! Defaults match the stock deployment: broadcast on 5555, ingress on
//! 5556, channel `GLOBAL`, username `Anon`.

use chanrelay_protocol::{validate_channel, validate_username, ChannelName, ProtocolError, Username};
use serde::{Deserialize, Serialize};

use crate::render::RenderStyle;

/// Host the relay binds to when none is given.
pub const DEFAULT_RELAY_HOST: &str = "0.0.0.0";
/// Host a client connects to when none is given.
pub const DEFAULT_CLIENT_HOST: &str = "localhost";
/// Port of the broadcast (fan-out) endpoint.
pub const DEFAULT_BROADCAST_PORT: u16 = 5555;
/// Port of the ingress (collection) endpoint.
pub const DEFAULT_INGRESS_PORT: u16 = 5556;
pub const DEFAULT_CHANNEL: &str = "GLOBAL";
pub const DEFAULT_USERNAME: &str = "Anon";

// ---------------------------------------------------------------------------
// EndpointConfig
// ---------------------------------------------------------------------------

/// Where the relay's two endpoints live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub ingress_port: u16,
    pub broadcast_port: u16,
}

impl EndpointConfig {
    /// An endpoint on `host` with the default ports.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ingress_port: DEFAULT_INGRESS_PORT,
            broadcast_port: DEFAULT_BROADCAST_PORT,
        }
    }

    /// `host:port` of the ingress endpoint.
    pub fn ingress_addr(&self) -> String {
        join_host_port(&self.host, self.ingress_port)
    }

    /// `host:port` of the broadcast endpoint.
    pub fn broadcast_addr(&self) -> String {
        join_host_port(&self.host, self.broadcast_port)
    }

    pub fn ingress_url(&self) -> String {
        format!("ws://{}", self.ingress_addr())
    }

    pub fn broadcast_url(&self) -> String {
        format!("ws://{}", self.broadcast_addr())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_HOST)
    }
}

/// IPv6 literals need brackets before a port can follow.
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

/// Configuration for [`Relay`](crate::relay::Relay).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub endpoint: EndpointConfig,
    /// Log every relayed line at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::new(DEFAULT_RELAY_HOST),
            verbose: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Configuration for [`ChatClient`](crate::client::ChatClient).
///
/// Holds validated identifiers only, so a client can never be started
/// with a bad channel or username. Build one with
/// [`ClientConfig::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    endpoint: EndpointConfig,
    channel: ChannelName,
    username: Username,
    #[serde(default)]
    render: RenderStyle,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn render(&self) -> RenderStyle {
        self.render
    }
}

/// Collects raw client settings and validates them in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    endpoint: EndpointConfig,
    channel: String,
    username: String,
    render: RenderStyle,
}

impl ClientConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host = host.into();
        self
    }

    pub fn ingress_port(mut self, port: u16) -> Self {
        self.endpoint.ingress_port = port;
        self
    }

    pub fn broadcast_port(mut self, port: u16) -> Self {
        self.endpoint.broadcast_port = port;
        self
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn render(mut self, render: RenderStyle) -> Self {
        self.render = render;
        self
    }

    /// Validates the username and channel and produces the config.
    ///
    /// # Errors
    /// The username is checked first, then the channel; the first failure
    /// is returned.
    pub fn build(self) -> Result<ClientConfig, ProtocolError> {
        let username = validate_username(&self.username)?;
        let channel = validate_channel(&self.channel)?;
        Ok(ClientConfig {
            endpoint: self.endpoint,
            channel,
            username,
            render: self.render,
        })
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            channel: DEFAULT_CHANNEL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            render: RenderStyle::default(),
        }
    }
}
