//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--backend`, `--no-mouse`, `--threshold`, `--log-level`)
//! 2. Explicit `--config FILE`
//! 3. `$KBTREE_CONFIG` environment variable (path to config file)
//! 4. Project-local `.kbtree.toml` in the current working directory
//! 5. Global `~/.config/kbtree/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::tree::reorder::FailurePolicy;
use crate::tree::search::DEFAULT_DEBOUNCE_MS;
use crate::tree::virtualize::{
    VirtualizerConfig, DEFAULT_BUFFER_ROWS, DEFAULT_ENABLE_THRESHOLD, DEFAULT_ROW_HEIGHT,
};

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Base URL of the editor backend.
    pub backend_url: Option<String>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Height of one row in scroll units.
    pub row_height: Option<u32>,
    /// Extra rows rendered above and below the viewport.
    pub buffer_rows: Option<usize>,
    /// Row count above which windowed rendering kicks in.
    pub enable_threshold: Option<usize>,
    /// Use nerd font icons (false = text badges).
    pub use_icons: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before a typed query is applied.
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReorderConfig {
    /// What to do when saving an order fails: "keep" or "rollback".
    pub on_failure: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter, e.g. "info" or "kbtree=debug".
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<PathBuf>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub search: SearchConfig,
    pub reorder: ReorderConfig,
    pub logging: LoggingConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("KBTREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".kbtree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("kbtree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
///
/// Logging is not up yet when config loads, hence stderr.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                backend_url: other
                    .general
                    .backend_url
                    .clone()
                    .or(self.general.backend_url),
                mouse: other.general.mouse.or(self.general.mouse),
                request_timeout_secs: other
                    .general
                    .request_timeout_secs
                    .or(self.general.request_timeout_secs),
            },
            tree: TreeConfig {
                row_height: other.tree.row_height.or(self.tree.row_height),
                buffer_rows: other.tree.buffer_rows.or(self.tree.buffer_rows),
                enable_threshold: other.tree.enable_threshold.or(self.tree.enable_threshold),
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
            },
            search: SearchConfig {
                debounce_ms: other.search.debounce_ms.or(self.search.debounce_ms),
            },
            reorder: ReorderConfig {
                on_failure: other
                    .reorder
                    .on_failure
                    .clone()
                    .or(self.reorder.on_failure),
            },
            logging: LoggingConfig {
                level: other.logging.level.clone().or(self.logging.level),
                file: other.logging.file.clone().or(self.logging.file),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that the highest-priority candidate merges last.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            match load_file(cli_path) {
                Some(file_cfg) => config = config.merge(&file_cfg),
                None if !cli_path.exists() => {
                    eprintln!("Warning: config file {} not found", cli_path.display());
                }
                None => {}
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn backend_url(&self) -> &str {
        self.general
            .backend_url
            .as_deref()
            .unwrap_or(DEFAULT_BACKEND_URL)
    }

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.general
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Windowing parameters. A zero row height is bumped to one.
    pub fn virtualizer(&self) -> VirtualizerConfig {
        VirtualizerConfig {
            row_height: self.tree.row_height.unwrap_or(DEFAULT_ROW_HEIGHT).max(1),
            buffer_rows: self.tree.buffer_rows.unwrap_or(DEFAULT_BUFFER_ROWS),
            enable_threshold: self
                .tree
                .enable_threshold
                .unwrap_or(DEFAULT_ENABLE_THRESHOLD),
        }
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(false)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    /// Unknown values fall back to `keep` with a warning.
    pub fn failure_policy(&self) -> FailurePolicy {
        match self.reorder.on_failure.as_deref() {
            None => FailurePolicy::Keep,
            Some(value) => {
                let policy = FailurePolicy::from_config(value);
                if policy.label() != value {
                    eprintln!("Warning: unknown reorder.on_failure {:?}, using keep", value);
                }
                policy
            }
        }
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.logging.file.as_deref()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
