//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--root`, `--no-watcher`, `--verbose`, etc.)
//! 2. Explicit `--config` file
//! 3. `$SFM_CONFIG` environment variable (path to config file)
//! 4. Project-local `.sfm.toml` in the current working directory
//! 5. Global `~/.config/sfm/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fs::listing::{NameFilter, DEFAULT_RESERVED_NAMES, DEFAULT_RESERVED_PREFIXES};
use crate::fs::search::DEFAULT_SEARCH_DEBOUNCE_MS;
use crate::fs::sort::{SortConfig, SortDirection, SortKey};
use crate::fs::storage::DEFAULT_MAX_DUPLICATE_PROBES;
use crate::fs::watcher::DEFAULT_WATCH_DEBOUNCE_MS;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Storage root (overridden by `--root`).
    pub root: Option<String>,
}

/// Which children the lister hides besides dotfiles.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ListingConfig {
    pub reserved_names: Option<Vec<String>>,
    pub reserved_prefixes: Option<Vec<String>>,
}

/// Initial sort order.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SortSection {
    /// "name", "size" or "date".
    pub key: Option<String>,
    /// "asc" or "desc".
    pub direction: Option<String>,
}

/// Search settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Delay between the last query change and the search starting.
    pub debounce_ms: Option<u64>,
}

/// Paste settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TransferConfig {
    /// Highest `(N)` suffix probed before a paste gives up.
    pub max_duplicate_probes: Option<usize>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Enable filesystem watcher for auto-refresh.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Default `tracing` filter, e.g. "info" or "secure_files=debug".
    pub level: Option<String>,
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
    pub listing: ListingConfig,
    pub sort: SortSection,
    pub search: SearchConfig,
    pub transfer: TransferConfig,
    pub watcher: WatcherConfig,
    pub log: LogConfig,
}

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("SFM_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".sfm.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("sfm").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed; a parse failure is pushed onto
/// `warnings`.
fn load_file(path: &Path, warnings: &mut Vec<String>) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warnings.push(format!("failed to parse config file {}: {}", path.display(), e));
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
                root: other.general.root.clone().or(self.general.root),
            },
            listing: ListingConfig {
                reserved_names: other
                    .listing
                    .reserved_names
                    .clone()
                    .or(self.listing.reserved_names),
                reserved_prefixes: other
                    .listing
                    .reserved_prefixes
                    .clone()
                    .or(self.listing.reserved_prefixes),
            },
            sort: SortSection {
                key: other.sort.key.clone().or(self.sort.key),
                direction: other.sort.direction.clone().or(self.sort.direction),
            },
            search: SearchConfig {
                debounce_ms: other.search.debounce_ms.or(self.search.debounce_ms),
            },
            transfer: TransferConfig {
                max_duplicate_probes: other
                    .transfer
                    .max_duplicate_probes
                    .or(self.transfer.max_duplicate_probes),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            log: LogConfig {
                level: other.log.level.clone().or(self.log.level),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    ///
    /// Loading happens before logging is set up (the log level comes from
    /// the config), so problems are returned as warnings for the caller to
    /// log once tracing is initialised.
    pub fn load(
        cli_config_path: Option<&Path>,
        cli_overrides: Option<&AppConfig>,
    ) -> (AppConfig, Vec<String>) {
        let mut config = AppConfig::default();
        let mut warnings = Vec::new();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path, &mut warnings) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path, &mut warnings) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        (config, warnings)
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Storage root; defaults to `~/.local/share/sfm` (or `./sfm-data`).
    pub fn root(&self) -> PathBuf {
        match &self.general.root {
            Some(root) => PathBuf::from(root),
            None => dirs::data_dir()
                .map(|d| d.join("sfm"))
                .unwrap_or_else(|| PathBuf::from("sfm-data")),
        }
    }

    pub fn name_filter(&self) -> NameFilter {
        let names = self.listing.reserved_names.clone().unwrap_or_else(|| {
            DEFAULT_RESERVED_NAMES.iter().map(|s| s.to_string()).collect()
        });
        let prefixes = self.listing.reserved_prefixes.clone().unwrap_or_else(|| {
            DEFAULT_RESERVED_PREFIXES.iter().map(|s| s.to_string()).collect()
        });
        NameFilter::new(names, prefixes)
    }

    pub fn sort_config(&self) -> SortConfig {
        SortConfig::new(
            SortKey::parse(self.sort.key.as_deref().unwrap_or("name")),
            SortDirection::parse(self.sort.direction.as_deref().unwrap_or("asc")),
        )
    }

    pub fn search_debounce_ms(&self) -> u64 {
        self.search.debounce_ms.unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS)
    }

    pub fn max_duplicate_probes(&self) -> usize {
        self.transfer
            .max_duplicate_probes
            .unwrap_or(DEFAULT_MAX_DUPLICATE_PROBES)
    }

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Watcher debounce interval in milliseconds.
    pub fn watcher_debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_WATCH_DEBOUNCE_MS)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or("info")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
