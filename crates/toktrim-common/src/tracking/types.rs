use serde::{Deserialize, Serialize};

/// One line of the metrics log: a single invocation whose output changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// RFC 3339 timestamp (UTC).
    pub timestamp: String,
    pub session_id: String,
    pub tool: String,
    /// Comma-joined technique label chain, in pipeline order.
    pub technique: String,
    pub original_chars: usize,
    pub filtered_chars: usize,
    pub savings_percent: f64,
}

impl MetricRecord {
    /// Individual technique labels from the chain.
    pub fn techniques(&self) -> impl Iterator<Item = &str> {
        self.technique
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Characters removed by this invocation (negative if output grew).
    #[allow(clippy::cast_possible_wrap)]
    pub const fn saved_chars(&self) -> i64 {
        self.original_chars as i64 - self.filtered_chars as i64
    }
}

/// Percentage of `original` removed, rounded to two decimals. `0.0` when
/// `original` is zero.
#[allow(clippy::cast_precision_loss)]
pub fn calculate_savings(original: usize, filtered: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let pct = (original as f64 - filtered as f64) / original as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Rough token estimate used throughout reporting (4 chars per token).
pub const fn estimate_tokens(chars: usize) -> usize {
    chars / 4
}
