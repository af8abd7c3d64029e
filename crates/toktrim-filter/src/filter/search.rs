//! grep/rg style results grouped by file.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use toktrim_common::config::types::SearchConfig;

use super::{clip, count_noun};
use crate::Outcome;
use crate::pattern::{self, builtin};

const CONTENT_WIDTH: usize = 120;
const MIN_OUTPUT_LEN: usize = 20;
const LONG_PATH: usize = 50;
const PATH_SEGMENTS: usize = 3;

static MATCH_LINE: LazyLock<Regex> = LazyLock::new(|| builtin(r"^(.+?):(\d+):(.*)$"));
/// `file-12-content`, the context-line form of `grep -C`.
static CONTEXT_LINE: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^([^\s:]+\.[\w]+)-(\d+)-(.*)$"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<'a> {
    pub file: &'a str,
    pub line: usize,
    pub content: &'a str,
}

fn parse_line(line: &str) -> Option<Hit<'_>> {
    let caps = MATCH_LINE
        .captures(line)
        .or_else(|| CONTEXT_LINE.captures(line))?;
    Some(Hit {
        file: caps.get(1)?.as_str(),
        line: caps.get(2)?.as_str().parse().ok()?,
        content: caps.get(3)?.as_str(),
    })
}

/// Every line that parses as a search record.
pub fn parse(output: &str) -> Vec<Hit<'_>> {
    output.lines().filter_map(parse_line).collect()
}

/// `first/.../second-last/last` for long, deep paths.
pub fn compact_path(path: &str) -> Cow<'_, str> {
    let segments: Vec<&str> = path.split('/').collect();
    if path.chars().count() <= LONG_PATH || segments.len() <= PATH_SEGMENTS {
        return Cow::Borrowed(path);
    }
    let n = segments.len();
    Cow::Owned(format!(
        "{}/.../{}/{}",
        segments[0],
        segments[n - 2],
        segments[n - 1]
    ))
}

/// Group `output` by file. `None` when no line parses.
pub fn group_search_results(
    output: &str,
    max_per_file: usize,
    max_results: usize,
) -> Option<String> {
    let hits = parse(output);
    if hits.is_empty() {
        return None;
    }
    let mut groups: BTreeMap<&str, Vec<&Hit<'_>>> = BTreeMap::new();
    for hit in &hits {
        groups.entry(hit.file).or_default().push(hit);
    }

    let mut out = vec![format!(
        "🔍 {} in {}",
        count_noun(hits.len(), "match", "matches"),
        count_noun(groups.len(), "file", "files")
    )];
    let mut budget = max_results;
    let mut unlisted_hits = 0;
    let mut unlisted_files = 0;
    for (file, file_hits) in &groups {
        if budget == 0 {
            unlisted_hits += file_hits.len();
            unlisted_files += 1;
            continue;
        }
        out.push(format!(
            "{} ({})",
            compact_path(file),
            count_noun(file_hits.len(), "match", "matches")
        ));
        let shown = file_hits.len().min(max_per_file).min(budget);
        for hit in file_hits.iter().take(shown) {
            out.push(format!(
                "  {}: {}",
                hit.line,
                clip(hit.content.trim(), CONTENT_WIDTH)
            ));
        }
        budget -= shown;
        if file_hits.len() > shown {
            out.push(format!("  +{} more", file_hits.len() - shown));
        }
    }
    if unlisted_hits > 0 {
        out.push(format!(
            "+{} more matches in {}",
            unlisted_hits,
            count_noun(unlisted_files, "more file", "more files")
        ));
    }
    Some(out.join("\n"))
}

/// Apply to the output of a search `command`.
pub fn filter(command: &str, output: &str, config: &SearchConfig) -> Outcome {
    if !pattern::is_search_command(command) {
        return Outcome::Inapplicable;
    }
    if !output.contains(':') || output.chars().count() < MIN_OUTPUT_LEN {
        return Outcome::Unchanged;
    }
    group_search_results(output, config.max_per_file, config.max_results)
        .map_or(Outcome::Inapplicable, |s| Outcome::compare(output, s))
}
