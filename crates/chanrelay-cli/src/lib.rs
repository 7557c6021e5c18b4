//! Command-line arguments for the `chanrelay-relay` and `chanrelay-client`
//! binaries, and their conversion into library configuration.

use std::path::PathBuf;

use chanrelay::config::{
    EndpointConfig, DEFAULT_BROADCAST_PORT, DEFAULT_CHANNEL, DEFAULT_CLIENT_HOST,
    DEFAULT_INGRESS_PORT, DEFAULT_RELAY_HOST, DEFAULT_USERNAME,
};
use chanrelay::prelude::*;
use clap::{Args, Parser};
use tracing::Level;

/// Logging flags shared by both binaries.
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Where to write JSON log lines. Defaults to ~/.chanrelay/logs/<component>.log.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Also print human-readable logs to stderr.
    #[arg(long)]
    pub console: bool,
}

impl LogArgs {
    fn log_config(&self, level: Level) -> LogConfig {
        LogConfig {
            file: self.log_file.clone(),
            console: self.console,
            level,
        }
    }
}

/// Relay chat lines between publishers and subscribers.
#[derive(Parser, Debug, Clone)]
#[command(name = "chanrelay-relay", author, version, about, long_about = None)]
pub struct RelayArgs {
    /// Interface to bind both endpoints on.
    #[arg(long, default_value = DEFAULT_RELAY_HOST)]
    pub host: String,

    /// Port subscribers connect to.
    #[arg(long, default_value_t = DEFAULT_BROADCAST_PORT)]
    pub broadcast_port: u16,

    /// Port publishers send to.
    #[arg(long, default_value_t = DEFAULT_INGRESS_PORT)]
    pub ingress_port: u16,

    /// Log every relayed message.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

impl RelayArgs {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            endpoint: EndpointConfig {
                host: self.host.clone(),
                ingress_port: self.ingress_port,
                broadcast_port: self.broadcast_port,
            },
            verbose: self.verbose,
        }
    }

    pub fn log_config(&self) -> LogConfig {
        let level = if self.verbose { Level::DEBUG } else { Level::INFO };
        self.log.log_config(level)
    }
}

/// Chat on one channel through a chanrelay relay.
#[derive(Parser, Debug, Clone)]
#[command(name = "chanrelay-client", author, version, about, long_about = None)]
pub struct ClientArgs {
    /// Relay host.
    #[arg(long, default_value = DEFAULT_CLIENT_HOST)]
    pub host: String,

    /// Relay broadcast port.
    #[arg(long, default_value_t = DEFAULT_BROADCAST_PORT)]
    pub broadcast_port: u16,

    /// Relay ingress port.
    #[arg(long, default_value_t = DEFAULT_INGRESS_PORT)]
    pub ingress_port: u16,

    /// Channel to join. Case-insensitive.
    #[arg(short, long, default_value = DEFAULT_CHANNEL)]
    pub channel: String,

    /// Name shown next to your messages.
    #[arg(short, long, default_value = DEFAULT_USERNAME)]
    pub username: String,

    /// Print messages without ANSI styling.
    #[arg(long)]
    pub no_color: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

impl ClientArgs {
    /// Validates the channel and username.
    pub fn client_config(&self) -> Result<ClientConfig, ProtocolError> {
        let render = if self.no_color {
            RenderStyle::Plain
        } else {
            RenderStyle::Ansi
        };
        ClientConfig::builder()
            .host(self.host.clone())
            .broadcast_port(self.broadcast_port)
            .ingress_port(self.ingress_port)
            .channel(self.channel.clone())
            .username(self.username.clone())
            .render(render)
            .build()
    }

    pub fn log_config(&self) -> LogConfig {
        self.log.log_config(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Relay
    // =====================================================================

    #[test]
    fn test_relay_defaults() {
        let args = RelayArgs::try_parse_from(["chanrelay-relay"]).unwrap();
        let config = args.relay_config();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(args.log_config().level, Level::INFO);
        assert!(args.log_config().file.is_none());
        assert!(!args.log_config().console);
    }

    #[test]
    fn test_relay_flags() {
        let args = RelayArgs::try_parse_from([
            "chanrelay-relay",
            "--host",
            "127.0.0.1",
            "--broadcast-port",
            "7000",
            "--ingress-port",
            "7001",
            "--verbose",
            "--log-file",
            "/tmp/relay.log",
            "--console",
        ])
        .unwrap();
        let config = args.relay_config();
        assert_eq!(config.endpoint.broadcast_addr(), "127.0.0.1:7000");
        assert_eq!(config.endpoint.ingress_addr(), "127.0.0.1:7001");
        assert!(config.verbose);

        let log = args.log_config();
        assert_eq!(log.level, Level::DEBUG);
        assert_eq!(log.file, Some(PathBuf::from("/tmp/relay.log")));
        assert!(log.console);
    }

    #[test]
    fn test_relay_rejects_bad_port() {
        assert!(RelayArgs::try_parse_from(["chanrelay-relay", "--ingress-port", "70000"]).is_err());
    }

    // =====================================================================
    // Client
    // =====================================================================

    #[test]
    fn test_client_defaults() {
        let args = ClientArgs::try_parse_from(["chanrelay-client"]).unwrap();
        let config = args.client_config().unwrap();
        assert_eq!(config.endpoint(), &EndpointConfig::default());
        assert_eq!(config.channel().as_str(), "GLOBAL");
        assert_eq!(config.username().as_str(), "Anon");
        assert_eq!(config.render(), RenderStyle::Ansi);
    }

    #[test]
    fn test_client_flags() {
        let args = ClientArgs::try_parse_from([
            "chanrelay-client",
            "--host",
            "chat.local",
            "-c",
            "dev",
            "-u",
            "alice",
            "--no-color",
        ])
        .unwrap();
        let config = args.client_config().unwrap();
        assert_eq!(config.endpoint().host, "chat.local");
        assert_eq!(config.channel().as_str(), "DEV");
        assert_eq!(config.username().as_str(), "alice");
        assert_eq!(config.render(), RenderStyle::Plain);
    }

    #[test]
    fn test_client_invalid_username_is_reported() {
        let args =
            ClientArgs::try_parse_from(["chanrelay-client", "--username", "bad name"]).unwrap();
        let err = args.client_config().unwrap_err();
        assert_eq!(
            err.to_string(),
            "username can only contain letters, numbers, underscores, and hyphens"
        );
    }
}
