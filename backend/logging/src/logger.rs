//! Structured Logger
//!
//! Human-readable console output on stderr plus an optional daily-rolling
//! log file (`leadscan.log.YYYY-MM-DD`), JSON or plain text.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "leadscan.log";

/// Initialize the global logger. `RUST_LOG` overrides `level`. Calling this
/// twice is harmless; the second call does nothing.
pub fn init_logger(level: &str, log_dir: Option<&Path>, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let appender = log_dir.map(|dir| RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME));
    let (json_layer, text_layer) = match appender {
        Some(appender) if json => (
            Some(fmt::layer().json().with_writer(appender).with_ansi(false)),
            None,
        ),
        Some(appender) => (None, Some(fmt::layer().with_writer(appender).with_ansi(false))),
        None => (None, None),
    };

    // stdout belongs to command output
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}
