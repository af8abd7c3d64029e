//! Savings summaries over metric records.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use toktrim_common::tracking::types::{MetricRecord, calculate_savings, estimate_tokens};

const COMPACT_TECHNIQUES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TechniqueStats {
    pub technique: String,
    pub invocations: usize,
    pub original_chars: usize,
    pub filtered_chars: usize,
    pub savings_percent: f64,
}

/// Totals for one session, or for all records when `session_id` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: Option<String>,
    pub invocations: usize,
    pub original_chars: usize,
    pub filtered_chars: usize,
    pub saved_chars: i64,
    pub savings_percent: f64,
    pub original_tokens: usize,
    pub filtered_tokens: usize,
    /// Sorted by technique name. A record whose chain names several
    /// techniques counts towards each of them.
    pub by_technique: Vec<TechniqueStats>,
}

impl SessionSummary {
    pub fn from_records(session_id: Option<&str>, records: &[MetricRecord]) -> Self {
        let original_chars: usize = records.iter().map(|r| r.original_chars).sum();
        let filtered_chars: usize = records.iter().map(|r| r.filtered_chars).sum();

        let mut by_technique: BTreeMap<&str, TechniqueStats> = BTreeMap::new();
        for record in records {
            for technique in record.techniques() {
                let stats = by_technique
                    .entry(technique)
                    .or_insert_with(|| TechniqueStats {
                        technique: technique.to_string(),
                        ..TechniqueStats::default()
                    });
                stats.invocations += 1;
                stats.original_chars += record.original_chars;
                stats.filtered_chars += record.filtered_chars;
            }
        }
        let by_technique = by_technique
            .into_values()
            .map(|mut s| {
                s.savings_percent = calculate_savings(s.original_chars, s.filtered_chars);
                s
            })
            .collect();

        Self {
            session_id: session_id.map(ToString::to_string),
            invocations: records.len(),
            original_chars,
            filtered_chars,
            saved_chars: records.iter().map(MetricRecord::saved_chars).sum(),
            savings_percent: calculate_savings(original_chars, filtered_chars),
            original_tokens: estimate_tokens(original_chars),
            filtered_tokens: estimate_tokens(filtered_chars),
            by_technique,
        }
    }

    /// Techniques ordered by savings percentage, best first.
    fn ranked(&self) -> Vec<&TechniqueStats> {
        let mut ranked: Vec<&TechniqueStats> = self.by_technique.iter().collect();
        ranked.sort_by(|a, b| {
            b.savings_percent
                .partial_cmp(&a.savings_percent)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.technique.cmp(&b.technique))
        });
        ranked
    }

    /// Multi-line report with totals and a per-technique breakdown.
    pub fn render_verbose(&self) -> String {
        let title = match self.session_id.as_deref() {
            Some(id) => format!("toktrim savings (session {id})"),
            None => "toktrim savings".to_string(),
        };
        let mut out = vec![
            title,
            format!("  invocations:    {}", self.invocations),
            format!(
                "  original:       {} chars (~{} tokens)",
                format_num(to_i64(self.original_chars)),
                format_num(to_i64(self.original_tokens))
            ),
            format!(
                "  filtered:       {} chars (~{} tokens)",
                format_num(to_i64(self.filtered_chars)),
                format_num(to_i64(self.filtered_tokens))
            ),
            format!(
                "  saved:          {} chars ({:.1}%)",
                format_num(self.saved_chars),
                self.savings_percent
            ),
        ];
        if !self.by_technique.is_empty() {
            out.push("  by technique:".to_string());
            for t in self.ranked() {
                out.push(format!(
                    "    {:22}  runs: {:4}  saved: {} chars ({:.1}%)",
                    t.technique,
                    t.invocations,
                    format_num(to_i64(t.original_chars) - to_i64(t.filtered_chars)),
                    t.savings_percent
                ));
            }
        }
        out.join("\n")
    }

    /// One line for a transient notification: overall savings and the top
    /// techniques by savings percentage.
    pub fn render_compact(&self) -> String {
        if self.invocations == 0 {
            return "toktrim: no savings recorded yet".to_string();
        }
        let mut line = format!(
            "toktrim: saved {} chars ({:.1}%) over {} calls",
            format_num(self.saved_chars),
            self.savings_percent,
            self.invocations
        );
        let ranked = self.ranked();
        if !ranked.is_empty() {
            let shown: Vec<String> = ranked
                .iter()
                .take(COMPACT_TECHNIQUES)
                .map(|t| format!("{} {:.1}%", t.technique, t.savings_percent))
                .collect();
            line.push_str(" | ");
            line.push_str(&shown.join(", "));
            if ranked.len() > COMPACT_TECHNIQUES {
                line.push_str(&format!(" +{} more", ranked.len() - COMPACT_TECHNIQUES));
            }
        }
        line
    }
}

/// One summary per session id, sorted by id.
pub fn by_session(records: &[MetricRecord]) -> Vec<SessionSummary> {
    let mut groups: BTreeMap<&str, Vec<MetricRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.session_id.as_str())
            .or_default()
            .push(record.clone());
    }
    groups
        .into_iter()
        .map(|(id, records)| SessionSummary::from_records(Some(id), &records))
        .collect()
}

#[allow(clippy::cast_possible_wrap)]
const fn to_i64(n: usize) -> i64 {
    n as i64
}

/// Thousands-separated integer.
pub fn format_num(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let chunks: Vec<&str> = s
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|c| std::str::from_utf8(c).unwrap_or(""))
        .collect();
    let formatted = chunks.join(",");
    if n < 0 {
        format!("-{formatted}")
    } else {
        formatted
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record(session: &str, technique: &str, original: usize, filtered: usize) -> MetricRecord {
        MetricRecord {
            timestamp: "2026-03-01T12:00:00+00:00".to_string(),
            session_id: session.to_string(),
            tool: "bash".to_string(),
            technique: technique.to_string(),
            original_chars: original,
            filtered_chars: filtered,
            savings_percent: calculate_savings(original, filtered),
        }
    }

    #[test]
    fn format_num_basic() {
        assert_eq!(format_num(0), "0");
        assert_eq!(format_num(999), "999");
        assert_eq!(format_num(1000), "1,000");
        assert_eq!(format_num(84320), "84,320");
        assert_eq!(format_num(-73080), "-73,080");
    }

    #[test]
    fn totals_and_attribution() {
        let records = vec![
            record("s1", "ansi,build", 1000, 100),
            record("s1", "git", 400, 200),
        ];
        let s = SessionSummary::from_records(Some("s1"), &records);
        assert_eq!(s.invocations, 2);
        assert_eq!(s.original_chars, 1400);
        assert_eq!(s.filtered_chars, 300);
        assert_eq!(s.saved_chars, 1100);
        assert_eq!(s.original_tokens, 350);
        let names: Vec<&str> = s.by_technique.iter().map(|t| t.technique.as_str()).collect();
        assert_eq!(names, vec!["ansi", "build", "git"]);
        assert_eq!(s.by_technique[0].original_chars, 1000);
    }

    #[test]
    fn empty_summary() {
        let s = SessionSummary::from_records(None, &[]);
        assert_eq!(s.invocations, 0);
        assert!(s.savings_percent.abs() < f64::EPSILON);
        assert_eq!(s.render_compact(), "toktrim: no savings recorded yet");
        assert!(s.render_verbose().contains("invocations:    0"));
    }

    #[test]
    fn verbose_lists_techniques() {
        let s = SessionSummary::from_records(
            Some("abc"),
            &[record("abc", "build", 12_000, 2_000)],
        );
        let text = s.render_verbose();
        assert!(text.starts_with("toktrim savings (session abc)"));
        assert!(text.contains("12,000 chars (~3,000 tokens)"));
        assert!(text.contains("saved:          10,000 chars (83.3%)"));
        assert!(text.contains("build"));
    }

    #[test]
    fn compact_sorted_and_capped() {
        let records: Vec<MetricRecord> = [
            ("t1", 100, 90),
            ("t2", 100, 10),
            ("t3", 100, 50),
            ("t4", 100, 80),
            ("t5", 100, 30),
            ("t6", 100, 70),
            ("t7", 100, 60),
        ]
        .iter()
        .map(|(t, o, f)| record("s", t, *o, *f))
        .collect();
        let line = SessionSummary::from_records(Some("s"), &records).render_compact();
        assert!(
            line.ends_with("| t2 90.0%, t5 70.0%, t3 50.0%, t7 40.0%, t6 30.0% +2 more"),
            "got: {line}"
        );
    }

    #[test]
    fn grouped_by_session() {
        let records = vec![
            record("b", "git", 10, 5),
            record("a", "build", 10, 5),
            record("b", "test", 10, 5),
        ];
        let groups = by_session(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].session_id.as_deref(), Some("a"));
        assert_eq!(groups[1].invocations, 2);
    }
}
