//! Runtime configuration.
//!
//! Defaults come from the platform data directory; every field can be
//! overridden through `ROLLUP_*` environment variables.

use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Directory holding the file-backed action log.
    pub data_dir: PathBuf,

    /// Attempts allowed for operations that retry lost races.
    pub retry_limit: u32,

    /// Broadcast capacity per event topic.
    pub event_capacity: usize,

    /// Drop folded log entries after each committed rollup.
    pub compact_log: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            retry_limit: 3,
            event_capacity: 100,
            compact_log: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("ROLLUP_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(limit) = read_env::<u32>("ROLLUP_RETRY_LIMIT") {
            config.retry_limit = limit.max(1);
        }

        if let Some(capacity) = read_env::<usize>("ROLLUP_EVENT_CAPACITY") {
            config.event_capacity = capacity.max(1);
        }

        if let Some(compact) = read_env::<bool>("ROLLUP_COMPACT_LOG") {
            config.compact_log = compact;
        }

        config
    }

    /// Location of the action log for the policy named `policy`.
    pub fn action_log_path(&self, policy: &str) -> PathBuf {
        self.data_dir.join(action_log_name(policy))
    }
}

/// File name of the action log for `policy`. Logs of different policies
/// hold different action types and never share a file.
pub fn action_log_name(policy: &str) -> String {
    format!("actions-{policy}.log")
}

/// Platform data directory, e.g. `~/.local/share/rollup` on Linux.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "rollup")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./rollup_data"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
