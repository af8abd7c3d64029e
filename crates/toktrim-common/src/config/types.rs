use serde::{Deserialize, Serialize};

/// Top-level pipeline configuration, deserialized from `config.toml`.
///
/// Every struct in the tree uses `#[serde(default)]`, so a partial document
/// only overrides the keys it names. Keys are camelCase:
///
/// ```toml
/// [techniques.truncation]
/// maxChars = 5000
///
/// [techniques.source]
/// level = "aggressive"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Master switch. When false every invocation passes through untouched.
    pub enabled: bool,
    pub techniques: Techniques,
    pub metrics: MetricsConfig,
    pub notifications: NotificationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            techniques: Techniques::default(),
            metrics: MetricsConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Per-technique enable flags and thresholds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Techniques {
    pub ansi: Toggle,
    pub truncation: TruncationConfig,
    pub build: Toggle,
    pub test: Toggle,
    pub linter: Toggle,
    pub git: GitConfig,
    pub search: SearchConfig,
    pub source: SourceConfig,
    pub structure_truncation: StructureTruncationConfig,
}

/// A technique with nothing to tune beyond on/off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Toggle {
    pub enabled: bool,
}

impl Default for Toggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Hard character cap, always the last stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TruncationConfig {
    pub enabled: bool,
    pub max_chars: usize,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_chars: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitConfig {
    pub enabled: bool,
    /// Output line cap for compacted diffs.
    pub max_diff_lines: usize,
    /// Commits kept from `git log` before the `+N more commits` trailer.
    pub max_log_commits: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_diff_lines: 300,
            max_log_commits: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    pub enabled: bool,
    pub max_per_file: usize,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_per_file: 10,
            max_results: 30,
        }
    }
}

/// How hard the source filter reduces file reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLevel {
    /// Strip comments, keep doc comments, collapse blank runs.
    #[default]
    Minimal,
    /// Minimal, then keep only imports and signatures.
    Aggressive,
}

impl SourceLevel {
    /// Technique label recorded when this level changes the text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minimal => "source-minimal",
            Self::Aggressive => "source-aggressive",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
    pub enabled: bool,
    pub level: SourceLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureTruncationConfig {
    pub enabled: bool,
    pub max_lines: usize,
}

impl Default for StructureTruncationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_lines: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Overrides the default metrics log location.
    pub path: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationConfig {
    pub enabled: bool,
    /// Turns between compact session summaries. `0` disables them.
    pub update_cadence: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            update_cadence: 5,
        }
    }
}
