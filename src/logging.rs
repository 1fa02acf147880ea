//! Logging setup for tablelens
//!
//! Log events go to stderr, so that `--json` output on stdout stays clean,
//! and to daily rolling files in the platform data directory.
//!
//! - `tablelens.<date>.log`: everything the filter lets through
//! - `error.<date>.log`: warnings and errors only
//!
//! The level defaults to `info` (`debug` with `--verbose`) and can be
//! overridden with `RUST_LOG`. If the log directory cannot be created the
//! file layers are skipped and only stderr is used.
//!
//! ```no_run
//! tablelens::logging::init(false)?;
//! tracing::info!("Dashboard started");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const MAX_LOG_FILES: usize = 10;

/// Gets the log directory path based on platform conventions, creating it
/// if needed.
///
/// Returns:
/// - Windows: `%APPDATA%/tablelens/logs`
/// - macOS: `~/Library/Application Support/tablelens/logs`
/// - Linux: `~/.local/share/tablelens/logs`
///
/// # Errors
///
/// Returns an error when there is no data directory or it cannot be created.
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("tablelens").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} log file appender"))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level(verbose)))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_line_number(verbose)
        .with_file(verbose)
        .with_writer(std::io::stderr);

    let files = get_log_dir().and_then(|dir| {
        let all = appender(&dir, "tablelens")?;
        let errors = appender(&dir, "error")?;
        Ok((dir, all, errors))
    });

    let (log_dir, all_logs_layer, error_logs_layer, file_error) = match files {
        Ok((dir, all, errors)) => (
            Some(dir),
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(all),
            ),
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(errors)
                    .with_filter(EnvFilter::new("warn")),
            ),
            None,
        ),
        Err(err) => (None, None, None, Some(err)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install logging")?;

    if let Some(err) = file_error {
        tracing::warn!("File logging disabled: {err:#}");
    }
    if let Some(dir) = log_dir {
        tracing::debug!("Logging initialized, log directory: {}", dir.display());
    }

    Ok(())
}
