//! Logging setup
//!
//! Installed explicitly from `main`, never as an import-time side effect.
//! Logs always go to stdout; set `TRANSFER_LOG_DIR` to also write a
//! daily-rolling file, optionally as JSON lines.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Where and how log lines are written.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for the rolling log file. `None` logs to stdout only.
    pub dir: Option<String>,
    /// File name prefix inside `dir`.
    pub file: String,
    /// Emit the file layer as JSON lines instead of text.
    pub use_json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            file: "remit.log".to_string(),
            use_json: false,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: std::env::var("TRANSFER_LOG_LEVEL").unwrap_or(defaults.level),
            dir: std::env::var("TRANSFER_LOG_DIR").ok(),
            file: std::env::var("TRANSFER_LOG_FILE").unwrap_or(defaults.file),
            use_json: std::env::var("TRANSFER_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Install the global subscriber.
///
/// Returns the appender guard when a file layer is active; hold it for the
/// life of the process or buffered lines are lost on exit.
pub fn init_logging(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);

    // fmt::layer() is generic over the stack it lands on, so each branch
    // builds its own stdout layer
    match &settings.dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, &settings.file);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            if settings.use_json {
                let file_layer = fmt::layer()
                    .json()
                    .with_target(true) // Keep target in JSON for structured queries
                    .with_writer(non_blocking)
                    .with_ansi(false);
                let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
                registry.with(file_layer).with(stdout_layer).init();
            } else {
                let file_layer = fmt::layer()
                    .with_target(false)
                    .with_writer(non_blocking)
                    .with_ansi(false);
                let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
                registry.with(file_layer).with(stdout_layer).init();
            }
            Some(guard)
        }
        None => {
            let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
            registry.with(stdout_layer).init();
            None
        }
    }
}
