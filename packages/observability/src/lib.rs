//! # Observability
//!
//! Logging setup shared by the session-auth binaries.
//!
//! Binaries call [`init`] or [`init_with_config`] once at startup and use
//! standard `tracing` macros everywhere else. Library crates never install a
//! subscriber themselves.
//!
//! By default logs go to stderr in compact form. With a `log_path`, every
//! event is also appended to that file as one JSON object per line:
//!
//! ```text
//! tail -f ~/.local/share/session-auth/logs/cli.jsonl | jq
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("session-auth").ok();
//!     tracing::info!("ready");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "session-auth".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/tmp/session-auth.jsonl".into()),
//!     ..Default::default()
//! })?;
//! ```

mod file;

pub use file::LogFileWriter;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, logged once at startup.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSON-lines log file.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr when writing to a file.
    /// Without a file, stderr is always used.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

impl LogConfig {
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }

    fn stderr_enabled(&self) -> bool {
        self.also_stderr || self.log_path.is_none()
    }
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) -> io::Result<()> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Initialize logging with custom configuration.
///
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let file_layer = match &config.log_path {
        Some(path) => {
            let writer = LogFileWriter::open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(writer)
                    .with_filter(config.env_filter()),
            )
        }
        None => None,
    };

    let stderr_layer = if config.stderr_enabled() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(io::stderr)
                .with_filter(config.env_filter()),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(io::Error::other)?;

    tracing::debug!(
        service = %config.service_name,
        log_path = ?config.log_path,
        "observability initialized"
    );
    Ok(())
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};
