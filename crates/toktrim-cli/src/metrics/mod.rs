//! Append-only JSON Lines metrics log.
//!
//! Each line is one self-contained [`MetricRecord`]; readers never depend on
//! earlier lines, so a corrupt line costs only itself.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Context as _;

pub use toktrim_common::tracking::types::MetricRecord;
use toktrim_common::config::types::MetricsConfig;

use crate::paths;

/// Log location for `config`: an explicit `metrics.path` wins over the
/// environment and platform defaults.
pub fn resolve_path(config: &MetricsConfig) -> Option<PathBuf> {
    match config.path.as_deref() {
        Some(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => paths::metrics_path(),
    }
}

/// Serialized appender for one log file.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Sink for `config`, or `None` when metrics are off or no location can
    /// be determined.
    pub fn from_config(config: &MetricsConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        resolve_path(config).map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be created or the
    /// write fails.
    pub fn append(&self, record: &MetricRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record).context("serialize metric record")?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create metrics dir {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open metrics log {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .with_context(|| format!("append to metrics log {}", self.path.display()))
    }
}

/// Parse JSON Lines text, skipping blank and malformed lines.
pub fn parse_records(text: &str) -> Vec<MetricRecord> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping malformed metrics line {}: {e}", i + 1);
                None
            }
        })
        .collect()
}

/// Every record in the log at `path`. A missing log is empty.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<MetricRecord>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(parse_records(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("read metrics log {}", path.display())),
    }
}
