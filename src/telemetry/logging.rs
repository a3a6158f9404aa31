//! Logging configuration and initialization
//!
//! Structured logging with tracing: compact console output for development,
//! JSON lines for log aggregation, and an optional non-blocking log file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Also write logs to this file (default: none)
    pub file_path: Option<PathBuf>,
    /// Use JSON format for console logs (default: false)
    pub json_format: bool,
    /// Default log level filter (default: "info")
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Defaults overridden by the environment
    ///
    /// - `MLCV_LOG_FORMAT`: set to "json" for JSON output
    /// - `MLCV_LOG_FILE`: path of an additional plain-text log file
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("MLCV_LOG_FORMAT").ok().as_deref(),
            std::env::var_os("MLCV_LOG_FILE").map(PathBuf::from),
        )
    }

    fn from_vars(format: Option<&str>, file_path: Option<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            file_path: file_path.filter(|p| !p.as_os_str().is_empty()),
            json_format: format.map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(defaults.json_format),
            ..defaults
        }
    }
}

/// Initialize the logging system with the given configuration
///
/// Returns a guard that must be kept alive for the duration of the program
/// so file logging is flushed. The filter comes from `MLCV_LOG`, then
/// `RUST_LOG`, then `default_level`.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env("MLCV_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let mut file_guard: Option<WorkerGuard> = None;

    if let Some(log_path) = &config.file_path {
        let file = std::fs::File::create(log_path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        file_guard = Some(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);
        let console_layer = fmt::layer().with_target(true).compact();
        subscriber.with(file_layer).with(console_layer).try_init()?;

        eprintln!("Logging to file: {}", log_path.display());
    } else if config.json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        subscriber.with(json_layer).try_init()?;
    } else {
        let console_layer = fmt::layer().with_target(true).compact();
        subscriber.with(console_layer).try_init()?;
    }

    tracing::info!(
        target: "molecule_viz",
        version = env!("CARGO_PKG_VERSION"),
        json_format = config.json_format,
        file = config.file_path.is_some(),
        "Logging initialized"
    );

    Ok(file_guard)
}

// Re-export WorkerGuard so callers can store it
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;
