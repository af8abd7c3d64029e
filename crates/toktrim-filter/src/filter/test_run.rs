//! Test runner output: pass/fail/skip counts plus the first few failures.

use std::sync::LazyLock;

use regex::Regex;

use super::{clip, is_generated_header};
use crate::Outcome;
use crate::block::{self, Segment};
use crate::pattern::{self, builtin};

const MAX_FAILURES: usize = 5;
const MAX_DETAIL_LINES: usize = 3;
const DETAIL_WIDTH: usize = 120;

/// Summary-line detectors, most specific first. The first one that matches
/// any line wins and every line it matches contributes to the counts.
static SUMMARY_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // cargo / libtest
        r"^\s*test result: (?:ok|FAILED)\.",
        // jest, vitest
        r"^\s*Tests:?\s+.*\d+\s+(?:passed|failed|skipped|todo)\b",
        // pytest
        r"^=+ .*\d+ (?:passed|failed|errors?|skipped)\b.* =+$",
        // mocha
        r"^\s*\d+\s+(?:passing|failing|pending)\b",
        // TAP, node --test
        r"^\s*(?:#|ℹ)\s+(?:pass|fail|skipped|skip|todo)\s+\d+",
        // python unittest
        r"^(?:Ran\s\d+\stests?\b|(?:OK|FAILED)\s*\((?:failures|errors|skipped)=)",
        r"\b\d+\s+passed\b.*\b\d+\s+failed\b|\b\d+\s+failed\b.*\b\d+\s+passed\b",
        r"\b\d+\s+pass\b.*\b\d+\s+fail\b",
        r"^\s*\d+\s+(?:passed|failed)\b",
    ]
    .into_iter()
    .map(builtin)
    .collect()
});

/// Count/label pairs inside a summary line, in either order.
static COUNT: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)
            (\d+)\s+(passed|passing|pass|failed|failing|fail|errors?|skipped|skip|ignored|pending|todo|total)\b
          | \b(pass|fail|skipped|skip|todo)\s+(\d+)\b
          | \b(failures|errors|skipped)=(\d+)
          | \b(Ran)\s+(\d+)\s+tests?\b
        ",
    )
});

static PASS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^\s*(?:✓|✔|√|--- PASS\b|ok\s+\d+\b|PASSED\b)|\.\.\.\s+ok\s*$|\sPASSED\b")
});

static FAIL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^\s*(?:✗|✘|×|✕|--- FAIL\b|not\s+ok\s+\d+\b|FAILED\b)|\.\.\.\s+FAILED\s*$")
});

static SKIP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^\s*--- SKIP\b|\.\.\.\s+(?:ignored|skipped)\s*$|\bSKIPPED\b"));

static FAILURE_START: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^(?:
            \s*FAIL\s+\S.*
          | \s*---\sFAIL:
          | \s*●\s
          | \s*(?:✗|✘|×|✕)\s
          | test\s\S+\s\.\.\.\sFAILED
          | ----\s.+\sstdout\s----
          | thread\s'.*'\spanicked\sat
          | FAILED\s
          | _{3,}\s.+\s_{3,}$
          | \s*\d+\)\s
          | (?:ERROR|FAIL):\s
          | not\sok\s\d+
        )",
    )
});

/// `FAIL\tpkg\t0.01s` closes a go test run rather than opening a failure.
static GO_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^(?:ok|FAIL)\s+\S+\s+(?:[\d.]+m?s|\(cached\))"));

static BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^\s*(?:
            running\s\d+\stests?
          | failures:\s*$
          | test\s\S+\s\.\.\.\s(?:ok|ignored)
          | (?:Test\sSuites|Snapshots|Time):\s
          | ={3,}
          | (?:PASS|FAIL|ok)\s*$
          | PASS\s
          | ---\s(?:PASS|SKIP):
          | (?:✓|✔|√)
        )",
    )
});

/// Single header lines that only introduce the block after them.
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^(?:----\s.+\sstdout\s----|\s*FAIL\s+\S.*)$"));

static FAILURE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^\s*(?:
            test\s(\S+)\s\.\.\.\sFAILED
          | ----\s(\S+)\sstdout\s----
          | FAILED\s\S*?::(\S+)
          | _{3,}\s(\S+)\s_{3,}
          | ---\sFAIL:\s(\S+)
        )",
    )
});

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| builtin(r"^\s*[-=_~]{5,}\s*$"));

/// Pass/fail/skip totals for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl Counts {
    fn tally(&mut self, label: &str, n: usize) {
        match label {
            "passed" | "passing" | "pass" => self.passed += n,
            "failed" | "failing" | "fail" | "error" | "errors" | "failures" => self.failed += n,
            "skipped" | "skip" | "ignored" | "pending" | "todo" => self.skipped += n,
            "total" | "Ran" => self.total += n,
            _ => {}
        }
    }

    /// Tools that only report a total (`Ran 4 tests`, `7 total`) imply the
    /// passed count.
    fn settle(mut self) -> Self {
        if self.passed == 0 && self.total > self.failed + self.skipped {
            self.passed = self.total - self.failed - self.skipped;
        }
        self
    }

    fn header(&self) -> String {
        let icon = if self.failed == 0 { "✓" } else { "✗" };
        let mut parts = vec![
            format!("{} passed", self.passed),
            format!("{} failed", self.failed),
        ];
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        format!("{icon} Tests: {}", parts.join(", "))
    }
}

fn tally_line(counts: &mut Counts, line: &str) {
    for caps in COUNT.captures_iter(line) {
        let (label, n) = if let (Some(n), Some(label)) = (caps.get(1), caps.get(2)) {
            (label, n)
        } else if let (Some(label), Some(n)) = (caps.get(3), caps.get(4)) {
            (label, n)
        } else if let (Some(label), Some(n)) = (caps.get(5), caps.get(6)) {
            (label, n)
        } else if let (Some(label), Some(n)) = (caps.get(7), caps.get(8)) {
            (label, n)
        } else {
            continue;
        };
        if let Ok(n) = n.as_str().parse::<usize>() {
            counts.tally(label.as_str(), n);
        }
    }
}

fn is_summary(line: &str) -> bool {
    !is_generated_header(line) && SUMMARY_TEMPLATES.iter().any(|t| t.is_match(line))
}

/// Whether any line of `output` is a test-runner summary line.
pub fn has_summary(output: &str) -> bool {
    output.lines().any(is_summary)
}

/// Lines written by the tool itself, not by an earlier filter.
fn tool_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|l| !is_generated_header(l))
}

/// Counts from the first summary template that matches, summed over every
/// line it matches. Falls back to counting per-test marker lines. `None`
/// when neither finds anything.
pub fn counts(output: &str) -> Option<Counts> {
    for template in SUMMARY_TEMPLATES.iter() {
        let mut lines = tool_lines(output).filter(|l| template.is_match(l)).peekable();
        if lines.peek().is_none() {
            continue;
        }
        let mut counts = Counts::default();
        for line in lines {
            tally_line(&mut counts, line);
        }
        return Some(counts.settle());
    }

    let mut counts = Counts::default();
    for line in tool_lines(output) {
        if FAIL_MARKER.is_match(line) {
            counts.failed += 1;
        } else if SKIP_MARKER.is_match(line) {
            counts.skipped += 1;
        } else if PASS_MARKER.is_match(line) {
            counts.passed += 1;
        }
    }
    (counts != Counts::default()).then_some(counts)
}

fn is_failure_start(line: &str) -> bool {
    FAILURE_START.is_match(line) && !GO_PACKAGE.is_match(line)
}

fn is_continuation(line: &str) -> bool {
    !BOUNDARY.is_match(line) && !GO_PACKAGE.is_match(line) && !is_summary(line)
}

/// Name of the test a failure line refers to.
fn failure_name(line: &str) -> Option<&str> {
    let caps = FAILURE_NAME.captures(line)?;
    caps.iter().skip(1).flatten().next().map(|m| m.as_str())
}

fn has_module_path(name: &str) -> bool {
    name.contains("::") || name.contains(['.', '/'])
}

fn last_component(name: &str) -> &str {
    name.rsplit([':', '.', '/']).find(|s| !s.is_empty()).unwrap_or(name)
}

/// Two names refer to the same test when they are equal, or when one of them
/// is bare (pytest's `___ test_add ___`) and the last components agree.
/// `a::works` and `b::works` are different tests.
fn same_test(a: &str, b: &str) -> bool {
    a == b
        || ((!has_module_path(a) || !has_module_path(b)) && last_component(a) == last_component(b))
}

/// Merge lone header blocks into the block after them.
fn merge_headers(blocks: Vec<Vec<&str>>) -> Vec<Vec<&str>> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut pending: Option<Vec<&str>> = None;
    for block in blocks {
        let header_only = matches!(block.as_slice(), [only] if HEADER.is_match(only));
        let block = match pending.take() {
            Some(mut head) => {
                head.extend(block);
                head
            }
            None => block,
        };
        if header_only && block.len() == 1 {
            pending = Some(block);
        } else {
            out.push(block);
        }
    }
    out.extend(pending);
    out
}

/// Drop one-line failure markers for tests that also have a detailed block.
fn dedupe(blocks: Vec<Vec<&str>>) -> Vec<Vec<&str>> {
    let detailed: Vec<&str> = blocks
        .iter()
        .filter(|b| b.len() > 1)
        .flat_map(|b| b.iter().take(2).copied())
        .filter_map(failure_name)
        .collect();
    let covered = |name: &str| detailed.iter().any(|d| same_test(d, name));
    blocks
        .into_iter()
        .filter(|b| match b.as_slice() {
            [only] => failure_name(only).is_none_or(|n| !covered(n)),
            _ => true,
        })
        .collect()
}

/// Failure blocks, merged and deduplicated.
pub fn failure_blocks(output: &str) -> Vec<Vec<&str>> {
    let raw = block::scan(output, is_failure_start, is_continuation)
        .filter_map(Segment::into_block)
        .collect();
    dedupe(merge_headers(raw))
}

fn render_block(out: &mut Vec<String>, lines: &[&str]) {
    let Some((first, rest)) = lines.split_first() else {
        return;
    };
    out.push(first.trim_end().to_string());
    let details: Vec<&str> = rest
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !SEPARATOR.is_match(l))
        .collect();
    for line in details.iter().take(MAX_DETAIL_LINES) {
        out.push(format!("    {}", clip(line, DETAIL_WIDTH)));
    }
    if details.len() > MAX_DETAIL_LINES {
        out.push(format!(
            "    +{} more lines",
            details.len() - MAX_DETAIL_LINES
        ));
    }
}

/// Header plus, for failing runs, the first failures. `None` when no counts
/// could be found at all.
pub fn summarize(output: &str) -> Option<String> {
    let counts = counts(output)?;
    let mut out = vec![counts.header()];
    if counts.failed > 0 {
        let blocks = failure_blocks(output);
        for lines in blocks.iter().take(MAX_FAILURES) {
            out.push(String::new());
            render_block(&mut out, lines);
        }
        if blocks.len() > MAX_FAILURES {
            out.push(String::new());
            out.push(format!("+{} more failures", blocks.len() - MAX_FAILURES));
        }
    }
    Some(out.join("\n"))
}

/// Apply to output of a test-runner `command`.
pub fn filter(command: &str, output: &str) -> Outcome {
    if !pattern::is_test_command(command) {
        return Outcome::Inapplicable;
    }
    summarize(output).map_or(Outcome::Unchanged, |s| Outcome::compare(output, s))
}
