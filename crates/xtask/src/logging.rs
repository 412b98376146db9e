//! Tracing setup for xtask.
//!
//! Logs go to stderr so command output on stdout stays pipeable. With
//! `--log-file` they are mirrored to `<cache>/rollup/logs/xtask.log`.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::dirs;

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the whole run.
pub fn init(verbose: bool, log_file: bool) -> Result<Option<WorkerGuard>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    if !log_file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    }

    let log_dir = dirs::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "xtask.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!("Log file: {}/xtask.log", log_dir.display());
    Ok(Some(guard))
}
