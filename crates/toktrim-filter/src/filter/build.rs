//! Build, compile and install output.
//!
//! Progress chatter is counted and dropped, error reports are kept whole
//! (up to a cap), warnings are reduced to their first line, and anything
//! else is dropped. A clean build collapses to a single line.

use std::sync::LazyLock;

use regex::Regex;

use super::{count_noun, test_run};
use crate::Outcome;
use crate::block::{self, Segment};
use crate::pattern::{self, builtin};

const MAX_ERROR_BLOCKS: usize = 5;
const MAX_BLOCK_LINES: usize = 10;
const MAX_WARNINGS: usize = 5;

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^\s*(?:
            (?:Compiling|Downloading|Downloaded|Fetching|Updating|Checking|Resolving|Locking
              |Adding|Removing|Installing|Installed|Building|Blocking|Packaging|Documenting
              |Fresh|Unpacking|Preparing|Collecting|Verifying|Extracting|Linking|Generating
              |Waiting|Progress)\b
          | (?:warning|error):\s.*(?:generated\s\d+\swarnings?|could\snot\scompile|aborting\sdue\sto)
          | npm\s(?:notice|http|timing|info)\b
          | added\s\d+\spackages?
          | up\sto\sdate,\saudited
          | found\s0\svulnerabilities
          | \d+\spackages?\sare\slooking\sfor\sfunding
          | run\s`npm\sfund`
          | Requirement\salready\ssatisfied
          | Using\scached
          | Successfully\s(?:installed|built)
          | go:\s(?:downloading|finding|extracting)
          | >\sTask\s
          | \[\d+/\d+\]
          | \d{1,3}%
          | \#\d+\s
          | [0-9a-f]{12}:\s(?:Pulling|Waiting|Downloading|Verifying|Download\scomplete|Extracting|Pull\scomplete)
        )",
    )
});

static ERROR_START: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^(?:
            error(?:\[E\d+\])?:
          | error\sTS\d+:
          | \S+\(\d+,\d+\):\s+error\b
          | \S+:\d+:(?:\d+:)?\s*(?:fatal\s+)?error:
          | \S+\.go:\d+:\d+:\s
          | fatal\serror:
          | npm\sERR!
          | (?:ERROR|Error|FAILED|FAILURE|BUILD\sFAILED)\b:?
          | \[ERROR\]
          | make(?:\[\d+\])?:\s\*\*\*
          | Traceback\s\(most\srecent\scall\slast\)
          | \w*(?:Error|Exception):\s
          | ld:\s
          | .*undefined\sreference\sto
          | ✘
        )",
    )
});

static WARNING: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^\s*(?:
            warning(?:\[\w+\])?:
          | \S+:\d+:(?:\d+:)?\s*warning:
          | \S+\(\d+,\d+\):\s+warning\b
          | \[WARNING\]
          | npm\sWARN\b
          | WARN(?:ING)?\b
          | ⚠
        )",
    )
});

static CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^(?:\s|\d+\s*\||-->|=\s|note:|help:|Caused\sby|\||\^|~)"));

static ELAPSED: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?i)^\s*(?:finished|done|build\ssuccessful|built|compiled\ssuccessfully)\b.*?\bin\s+(\d+(?:\.\d+)?\s?(?:ms|s|m|min)\b)",
    )
});

fn is_noise(line: &str) -> bool {
    NOISE.is_match(line)
}

fn is_error_start(line: &str) -> bool {
    ERROR_START.is_match(line) && !is_noise(line)
}

fn is_continuation(line: &str) -> bool {
    CONTINUATION.is_match(line)
}

/// Apply to output of a build-like `command`. Output carrying a test-runner
/// summary is never summarized as a build, even under a build-like command
/// (`make check`, `./gradlew build`).
pub fn filter(command: &str, output: &str) -> Outcome {
    if !pattern::is_build_command(command) || test_run::has_summary(output) {
        return Outcome::Inapplicable;
    }
    summarize(output).map_or(Outcome::Unchanged, |s| Outcome::compare(output, s))
}

/// Classified view of one build log.
#[derive(Debug, Default)]
struct BuildReport<'a> {
    noise: usize,
    errors: Vec<Vec<&'a str>>,
    warnings: Vec<&'a str>,
    elapsed: Option<&'a str>,
}

fn classify(output: &str) -> BuildReport<'_> {
    let mut report = BuildReport::default();
    for segment in block::scan(output, is_error_start, is_continuation) {
        match segment {
            Segment::Block(lines) => report.errors.push(lines),
            Segment::Line(line) => {
                if is_noise(line) {
                    report.noise += 1;
                } else if WARNING.is_match(line) {
                    report.warnings.push(line.trim());
                } else if report.elapsed.is_none()
                    && let Some(caps) = ELAPSED.captures(line)
                {
                    report.elapsed = caps.get(1).map(|m| m.as_str());
                }
            }
        }
    }
    report
}

/// Compact a build log. `None` when nothing in it was recognized, so an
/// unfamiliar log is never reported as a clean build.
pub fn summarize(output: &str) -> Option<String> {
    let report = classify(output);
    if report.noise == 0 && report.errors.is_empty() && report.warnings.is_empty() {
        return None;
    }

    if report.errors.is_empty() && report.warnings.is_empty() {
        let elapsed = report
            .elapsed
            .map(|t| format!(", {t}"))
            .unwrap_or_default();
        return Some(format!(
            "✓ Build succeeded ({}{elapsed})",
            count_noun(report.noise, "unit", "units")
        ));
    }

    let mut out = Vec::new();
    if report.errors.is_empty() {
        out.push(format!(
            "⚠ Build succeeded with {}",
            count_noun(report.warnings.len(), "warning", "warnings")
        ));
    } else {
        let mut header = format!(
            "✗ Build failed: {}",
            count_noun(report.errors.len(), "error", "errors")
        );
        if !report.warnings.is_empty() {
            header.push_str(", ");
            header.push_str(&count_noun(report.warnings.len(), "warning", "warnings"));
        }
        out.push(header);
    }

    for (i, lines) in report.errors.iter().take(MAX_ERROR_BLOCKS).enumerate() {
        if i > 0 {
            out.push(String::new());
        }
        out.extend(lines.iter().take(MAX_BLOCK_LINES).map(ToString::to_string));
        if lines.len() > MAX_BLOCK_LINES {
            out.push(format!("  ... +{} more lines", lines.len() - MAX_BLOCK_LINES));
        }
    }
    if report.errors.len() > MAX_ERROR_BLOCKS {
        out.push(format!(
            "... +{} more errors",
            report.errors.len() - MAX_ERROR_BLOCKS
        ));
    }

    if !report.warnings.is_empty() {
        if !report.errors.is_empty() {
            out.push(String::new());
            out.push(format!(
                "⚠ {}:",
                count_noun(report.warnings.len(), "warning", "warnings")
            ));
        }
        out.extend(
            report
                .warnings
                .iter()
                .take(MAX_WARNINGS)
                .map(|w| format!("  {w}")),
        );
        if report.warnings.len() > MAX_WARNINGS {
            out.push(format!(
                "  +{} more warnings",
                report.warnings.len() - MAX_WARNINGS
            ));
        }
    }

    Some(out.join("\n"))
}
