//! Logging setup for the goals CLI
//!
//! Diagnostics go to stderr so command output on stdout stays clean, and
//! optionally to a log file through a non-blocking appender.

use std::path::Path;

use goals_core::GoalsConfig;
use thiserror::Error;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Error types for logging setup
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    #[error("Failed to create log directory: {0}")]
    FileWrite(String),

    #[error("Filter compilation failed: {0}")]
    FilterCompilation(String),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LoggingError>;

/// Level used when `RUST_LOG` is not set
#[must_use]
pub fn effective_level(configured: &str, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        configured
    }
}

/// Build the filter, preferring `RUST_LOG` over the configured level
///
/// # Errors
/// Returns an error if the level is not a valid filter directive
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| LoggingError::FilterCompilation(format!("'{level}': {e}"))),
    }
}

/// Install the global subscriber described by `config`
///
/// The returned guard flushes the log file when dropped and must be kept
/// alive for the lifetime of the program.
///
/// # Errors
/// Returns an error if the filter is invalid, the log file location is
/// unusable, or a global subscriber is already installed
pub fn init_logging(config: &GoalsConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let level = effective_level(&config.log_level, verbose);
    let filter = build_filter(level)?;

    let (file_writer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let json_layer = config.json_logs.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_target(true)
    });
    let text_layer = (!config.json_logs).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbose)
    });
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    debug!(level, json = config.json_logs, "Logging initialized");
    Ok(guard)
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(directory).map_err(|e| {
        LoggingError::FileWrite(format!("{}: {e}", directory.display()))
    })?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
