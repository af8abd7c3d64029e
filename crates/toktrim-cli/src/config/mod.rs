//! Pipeline configuration discovery, merging and loading.
//!
//! Search order, first readable file wins:
//!   1. an explicit path (`--config`)
//!   2. `TOKTRIM_CONFIG`
//!   3. `<cwd>/.toktrim/config.toml`
//!   4. `<user_dir>/config.toml`
//!
//! A file is parsed as TOML, converted to a JSON value and deep-merged onto
//! the serialized defaults before typed deserialization. Anything that goes
//! wrong along the way logs a warning and yields the defaults.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_json::Value;

pub use toktrim_common::config::types::PipelineConfig;

use crate::paths;

const CADENCE_POINTER: &str = "/notifications/updateCadence";

/// Candidate config files in priority order.
pub fn search_paths(
    explicit: Option<&Path>,
    project_root: Option<&Path>,
    user_dir: Option<&Path>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("TOKTRIM_CONFIG")
        && !p.is_empty()
    {
        paths.push(PathBuf::from(p));
    }
    if let Some(root) = project_root {
        paths.push(root.join(".toktrim").join("config.toml"));
    }
    if let Some(dir) = user_dir {
        paths.push(dir.join("config.toml"));
    }
    paths
}

/// Recursively merge `over` into `base`. Objects merge key by key, `null`
/// leaves the base untouched, anything else replaces it.
pub fn deep_merge(base: &mut Value, over: &Value) {
    match (base, over) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        if !value.is_null() {
                            base.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// Coerce an update cadence into range: non-integers (and non-numbers) fall
/// back to `previous`, negatives clamp to 0.
pub fn normalize_cadence(candidate: &Value, previous: &Value) -> Value {
    let Some(n) = candidate.as_f64() else {
        return previous.clone();
    };
    if !n.is_finite() || n.fract().abs() > 0.0 {
        return previous.clone();
    }
    if n < 0.0 {
        return Value::from(0);
    }
    match candidate.as_u64().map(u32::try_from) {
        Some(Ok(v)) => Value::from(v),
        Some(Err(_)) => Value::from(u32::MAX),
        // Integral float such as `3.0`.
        None => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = n.min(f64::from(u32::MAX)) as u32;
            Value::from(v)
        }
    }
}

/// Merge a partial override onto `defaults`.
///
/// # Errors
/// Returns an error if the merged document no longer matches the
/// configuration schema (for example a string where a number belongs).
pub fn merge_override(defaults: &PipelineConfig, over: &Value) -> anyhow::Result<PipelineConfig> {
    let mut merged = serde_json::to_value(defaults).context("serialize default config")?;
    let previous = merged.pointer(CADENCE_POINTER).cloned().unwrap_or(Value::Null);
    deep_merge(&mut merged, over);
    if let Some(slot) = merged.pointer_mut(CADENCE_POINTER) {
        *slot = normalize_cadence(slot, &previous);
    }
    serde_json::from_value(merged).context("invalid configuration")
}

/// Parse a TOML document and merge it onto the defaults.
///
/// # Errors
/// Returns an error on TOML syntax errors or schema mismatches.
pub fn parse_toml(text: &str) -> anyhow::Result<PipelineConfig> {
    let doc: toml::Value = toml::from_str(text).context("parse config TOML")?;
    let over = serde_json::to_value(doc).context("convert config to JSON")?;
    merge_override(&PipelineConfig::default(), &over)
}

/// Read and parse the config at `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn try_load(path: &Path) -> anyhow::Result<PipelineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse_toml(&text).with_context(|| format!("load config {}", path.display()))
}

/// The first readable candidate, parsed; defaults when there is none or it
/// does not parse.
pub fn load_first(candidates: &[PathBuf]) -> PipelineConfig {
    for path in candidates {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                return parse_toml(&text).unwrap_or_else(|e| {
                    tracing::warn!("ignoring config {}: {e:#}", path.display());
                    PipelineConfig::default()
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}", path.display());
            }
            Err(e) => tracing::warn!("cannot read config {}: {e}", path.display()),
        }
    }
    PipelineConfig::default()
}

/// Effective configuration for this process.
pub fn load(explicit: Option<&Path>) -> PipelineConfig {
    if let Some(p) = explicit
        && !p.exists()
    {
        tracing::warn!("config file {} not found", p.display());
    }
    let cwd = std::env::current_dir().ok();
    let user_dir = paths::user_dir();
    load_first(&search_paths(explicit, cwd.as_deref(), user_dir.as_deref()))
}
