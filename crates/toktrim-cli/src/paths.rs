//! toktrim user-directory resolution.
//!
//! When `TOKTRIM_HOME` is set it replaces the platform-native config and data
//! directories. Project-local `.toktrim/` directories are unaffected.
//!
//! Metrics and session files add one more override on top:
//!   1. `TOKTRIM_METRICS_PATH` (metrics log only)
//!   2. `TOKTRIM_HOME`
//!   3. `dirs::data_local_dir().map(|d| d.join("toktrim"))`

use std::path::PathBuf;

fn resolve_user_path(dirs_fallback: Option<PathBuf>) -> Option<PathBuf> {
    if let Ok(home) = std::env::var("TOKTRIM_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs_fallback
}

/// Base directory for the global `config.toml`.
pub fn user_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::config_dir().map(|d| d.join("toktrim")))
}

/// Base directory for the metrics log and session state.
pub fn user_data_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::data_local_dir().map(|d| d.join("toktrim")))
}

/// Default metrics log location.
pub fn metrics_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TOKTRIM_METRICS_PATH")
        && !p.is_empty()
    {
        return Some(PathBuf::from(p));
    }
    user_data_dir().map(|d| d.join("metrics.jsonl"))
}

/// Where the CLI keeps per-session accumulator snapshots.
pub fn sessions_dir() -> Option<PathBuf> {
    user_data_dir().map(|d| d.join("sessions"))
}
