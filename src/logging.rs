//! Structured logging via `tracing`.
//!
//! The TUI owns the terminal, so log lines always go to a file.
//! `KBTREE_LOG` takes precedence over the configured level.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{AppError, Result};

/// Environment variable holding a filter directive, e.g. `kbtree=debug`.
pub const LOG_ENV: &str = "KBTREE_LOG";

/// Resolve the log file path: configured path, else the platform state
/// directory, else the cache directory, else the temp directory.
pub fn resolve_log_path(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
        return path.to_path_buf();
    }
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("kbtree")
        .join("kbtree.log")
}

/// Filter from `KBTREE_LOG`, falling back to `level`.
fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| AppError::Config(format!("invalid log level {:?}: {}", level, e)))
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Config(format!("failed to open log file {:?}: {}", path, e)))
}

/// Install the global subscriber. Returns the file being written to.
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<PathBuf> {
    let filter = build_env_filter(level)?;
    let path = resolve_log_path(file);
    let writer = Mutex::new(open_log_file(&path)?);

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| AppError::Config(format!("failed to install logger: {}", e)))?;

    Ok(path)
}
