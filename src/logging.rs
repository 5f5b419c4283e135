//! Tracing setup.
//!
//! The full-screen loader writes to `<logging.dir>/research-loader-<timestamp>.log`;
//! `check` and `timeline` log to stderr next to their output.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

pub struct LoggingHandle {
    /// Flushes the file writer on drop
    pub _guard: Option<WorkerGuard>,
    pub log_file_path: Option<PathBuf>,
}

/// Name of the log file for a session started now
fn log_file_name() -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    format!("research-loader-{timestamp}.log")
}

/// Level filter: RUST_LOG wins, then `--debug`, then the configured level
fn filter_directive(config: &Config, debug_override: bool) -> String {
    let log_level = if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    std::env::var("RUST_LOG").unwrap_or(log_level)
}

/// Where the session log goes, or `None` for stderr.
///
/// Only the full-screen loader writes to a file, since it owns the terminal.
fn log_file_target(config: &Config, is_tui_mode: bool) -> Option<PathBuf> {
    (is_tui_mode && config.logging.to_file).then(|| config.logs_path().join(log_file_name()))
}

/// Install the global subscriber.
///
/// Keep the returned handle alive until exit so buffered file output is flushed.
pub fn init_logging(
    config: &Config,
    is_tui_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let filter = tracing_subscriber::EnvFilter::new(filter_directive(config, debug_override));
    let log_file_path = log_file_target(config, is_tui_mode);

    let (writer, guard) = match &log_file_path {
        Some(path) => {
            let (dir, name) = match (path.parent(), path.file_name()) {
                (Some(dir), Some(name)) => (dir, name),
                _ => anyhow::bail!("Invalid log file path {}", path.display()),
            };
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let (non_blocking, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(log_file_path.is_none())
                .with_writer(writer),
        )
        .init();

    Ok(LoggingHandle {
        _guard: guard,
        log_file_path,
    })
}

/// A session log is only worth pointing at once something was written to it
fn has_log_output(path: &Path) -> bool {
    path.metadata().is_ok_and(|metadata| metadata.len() > 0)
}

/// Print the session log location if anything was written to it
pub fn report_log_file(path: &Path) {
    if has_log_output(path) {
        eprintln!("Session log: {}", path.display());
    }
}
