//! Structured logging setup shared by the relay and client binaries.
//!
//! Events go to a JSON-lines file, one object per event. The client keeps
//! stdout for chat lines, so the stderr console layer is opt-in.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::ChanrelayError;

/// Directory under `$HOME` that holds chanrelay state.
pub const STATE_DIR: &str = ".chanrelay";

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log file path. `None` means [`default_log_file`].
    pub file: Option<PathBuf>,
    /// Mirror events to stderr in human-readable form.
    pub console: bool,
    /// Minimum level when `RUST_LOG` is unset.
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            console: false,
            level: Level::INFO,
        }
    }
}

/// `$HOME/.chanrelay/logs/<component>.log`, or relative to the working
/// directory when `HOME` is unset.
pub fn default_log_file(component: &str) -> PathBuf {
    let base = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(STATE_DIR).join("logs").join(format!("{component}.log"))
}

/// Installs the global subscriber and returns the log file path.
///
/// Calling this more than once keeps the first subscriber and is not an
/// error.
///
/// # Errors
/// Returns [`ChanrelayError::Io`] if the log directory or file cannot be
/// created.
pub fn init_logging(component: &str, config: &LogConfig) -> Result<PathBuf, ChanrelayError> {
    let path = config
        .file
        .clone()
        .unwrap_or_else(|| default_log_file(component));
    let file = open_log_file(&path)?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();
    let console = config
        .console
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer(Mutex::new(file)))
        .with(console)
        .try_init();

    Ok(path)
}

/// The JSON-lines layer: event fields flattened next to `timestamp`,
/// `level` and `target`.
pub fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(writer)
}

fn open_log_file(path: &Path) -> Result<File, ChanrelayError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_log_file_layout() {
        let path = default_log_file("relay");
        assert!(path.ends_with(".chanrelay/logs/relay.log"));
    }

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("client.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_json_layer_writes_flat_objects() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(json_layer(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(event = "message_published", channel = "GLOBAL", bytes = 21, "relayed");
        });

        let bytes = captured.0.lock().unwrap().clone();
        let line = String::from_utf8(bytes).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["message"], "relayed");
        assert_eq!(value["event"], "message_published");
        assert_eq!(value["channel"], "GLOBAL");
        assert_eq!(value["bytes"], 21);
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_init_logging_returns_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            file: Some(dir.path().join("relay.log")),
            ..LogConfig::default()
        };
        let path = init_logging("relay", &config).unwrap();
        assert_eq!(path, dir.path().join("relay.log"));
        assert!(path.exists());

        // A second call is a no-op for the subscriber.
        assert!(init_logging("relay", &config).is_ok());
    }
}
