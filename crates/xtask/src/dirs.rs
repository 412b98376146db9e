//! Platform-specific directory utilities
//!
//! Action logs live in the runtime's data directory (see
//! `RuntimeConfig`); xtask only adds a cache directory for its own logs.

use std::path::PathBuf;

use runtime::RuntimeConfig;

/// Get the platform-specific log directory for xtask runs
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/rollup/logs`
/// - Linux: `~/.cache/rollup/logs` (or `$XDG_CACHE_HOME/rollup/logs`)
/// - Windows: `%LOCALAPPDATA%\rollup\logs`
/// - Fallback: `/tmp/rollup/logs`
pub fn log_dir() -> PathBuf {
    let base_dir = directories::ProjectDirs::from("", "", "rollup")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/rollup"));

    base_dir.join("logs")
}

/// Runtime configuration with an optional data directory override.
pub fn runtime_config(data_dir: Option<PathBuf>) -> RuntimeConfig {
    let mut config = RuntimeConfig::from_env();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config
}
