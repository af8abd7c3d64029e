//! Linter output: parse issues per linter profile, then report the most
//! frequent rules and files.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::count_noun;
use crate::Outcome;
use crate::pattern::{self, LinterKind, builtin};

const MAX_RULES: usize = 10;
const MAX_FILES: usize = 10;
const RULES_PER_FILE: usize = 3;

const UNKNOWN_FILE: &str = "(unknown)";
const UNNAMED_RULE: &str = "(unnamed)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub file: String,
    pub line: usize,
    pub rule: String,
    pub severity: Severity,
}

static ESLINT_FILE: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^(?:[A-Za-z]:)?[^\s:✖]*[/\\.][^\s]*$"));
static ESLINT_STYLISH: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^\s+(\d+):\d+\s+(error|warning)\s+(.+?)(?:\s{2,}(\S+))?\s*$")
});
static ESLINT_UNIX: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^(.+?):(\d+):\d+: .* \[(Error|Warning)/([\w@/-]+)\]\s*$")
});

static RUSTC_ISSUE: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^(warning|error)(?:\[([\w:-]+)\])?: (.+)$"));
static RUSTC_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"generated \d+ warnings?|could not compile|aborting due to|\d+ warnings? emitted|build failed",
    )
});
static LOCATION: LazyLock<Regex> = LazyLock::new(|| builtin(r"^\s*--> (.+?):(\d+)(?::\d+)?"));
static LINT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"#\[(?:warn|deny|forbid)\(([\w:]+)\)\]"));
static LINT_URL: LazyLock<Regex> = LazyLock::new(|| builtin(r"rust-clippy/.*#(\w+)"));

static RUFF_CONCISE: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^(.+?):(\d+):\d+: ([A-Z]{1,4}\d{2,4})\b"));
static RUFF_FULL: LazyLock<Regex> = LazyLock::new(|| builtin(r"^([A-Z]{1,4}\d{2,4}) "));

static PYLINT: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^(.+?):(\d+):\d+: ([CRWEFI])\d{4}: .*\(([\w-]+)\)\s*$")
});

static MYPY: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^(.+?):(\d+):(?:\d+:)? (error|warning): .*?(?:\s+\[([\w-]+)\])?\s*$")
});

static GOLANGCI: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^(.+?\.go):(\d+):(?:\d+:)? .* \(([\w-]+)\)\s*$"));
static GO_VET: LazyLock<Regex> = LazyLock::new(|| builtin(r"^(.+?\.go):(\d+):(?:\d+:)? "));

static RUBOCOP: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^(.+?):(\d+):\d+: ([CWEFR]): (?:\[Correctable\] )?([\w/]+): ")
});

static SHELLCHECK_GCC: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^(.+?):(\d+):\d+: (error|warning|note|info|style): .*\[(SC\d+)\]\s*$")
});
static SHELLCHECK_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"^In (.+?) line (\d+):\s*$"));
static SHELLCHECK_MARK: LazyLock<Regex> =
    LazyLock::new(|| builtin(r"\^[-^]* (SC\d+) \((error|warning|info|style)\):"));

static CLEAN: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?im)no\s+(?:problems|issues|errors|warnings|offenses)\b|all\s+checks\s+passed|\b0\s+(?:problems|errors|issues|offenses)\b|Success:\s+no\s+issues|rated\s+at\s+10\.00|^\s*Finished\s",
    )
});

type Rule = fn(&mut Parser, &str) -> bool;

const ESLINT_RULES: &[Rule] = &[Parser::eslint_unix, Parser::eslint_stylish];
const CLIPPY_RULES: &[Rule] = &[Parser::rustc];
const RUFF_RULES: &[Rule] = &[Parser::ruff];
const PYLINT_RULES: &[Rule] = &[Parser::pylint];
const MYPY_RULES: &[Rule] = &[Parser::mypy];
const GOLANGCI_RULES: &[Rule] = &[Parser::golangci];
const RUBOCOP_RULES: &[Rule] = &[Parser::rubocop];
const SHELLCHECK_RULES: &[Rule] = &[Parser::shellcheck];
/// Unknown linters try every profile; the loose eslint file header goes last.
const GENERIC_RULES: &[Rule] = &[
    Parser::rustc,
    Parser::pylint,
    Parser::rubocop,
    Parser::shellcheck,
    Parser::mypy,
    Parser::ruff,
    Parser::golangci,
    Parser::eslint_unix,
    Parser::eslint_stylish,
];

const fn profile(kind: LinterKind) -> &'static [Rule] {
    match kind {
        LinterKind::Eslint => ESLINT_RULES,
        LinterKind::Clippy => CLIPPY_RULES,
        LinterKind::Ruff => RUFF_RULES,
        LinterKind::Pylint => PYLINT_RULES,
        LinterKind::Mypy => MYPY_RULES,
        LinterKind::Golangci => GOLANGCI_RULES,
        LinterKind::Rubocop => RUBOCOP_RULES,
        LinterKind::Shellcheck => SHELLCHECK_RULES,
        LinterKind::Generic => GENERIC_RULES,
    }
}

/// Line-at-a-time issue parser. Multi-line formats (eslint stylish, rustc,
/// shellcheck tty) keep the file they are in, or the issue awaiting its
/// location, between lines.
#[derive(Debug, Default)]
struct Parser {
    issues: Vec<Issue>,
    file: Option<String>,
    file_line: usize,
    awaiting_location: Option<usize>,
}

fn number(caps: &Captures<'_>, group: usize) -> usize {
    caps.get(group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn text(caps: &Captures<'_>, group: usize) -> String {
    caps.get(group)
        .map_or_else(String::new, |m| m.as_str().to_string())
}

impl Parser {
    fn push(&mut self, file: String, line: usize, rule: String, severity: Severity) {
        self.issues.push(Issue {
            file,
            line,
            rule,
            severity,
        });
    }

    fn eslint_stylish(&mut self, line: &str) -> bool {
        if let Some(caps) = ESLINT_STYLISH.captures(line) {
            let Some(file) = self.file.clone() else {
                return false;
            };
            let severity = if &caps[2] == "error" {
                Severity::Error
            } else {
                Severity::Warning
            };
            self.push(file, number(&caps, 1), text(&caps, 4), severity);
            return true;
        }
        if ESLINT_FILE.is_match(line) {
            self.file = Some(line.trim().to_string());
            return true;
        }
        false
    }

    fn eslint_unix(&mut self, line: &str) -> bool {
        let Some(caps) = ESLINT_UNIX.captures(line) else {
            return false;
        };
        let severity = if &caps[3] == "Error" {
            Severity::Error
        } else {
            Severity::Warning
        };
        self.push(text(&caps, 1), number(&caps, 2), text(&caps, 4), severity);
        true
    }

    /// `error[E0308]: ...` / `warning: ...` followed by `--> file:line:col`.
    /// The lint name comes from the bracket, a `#[warn(...)]` note or a
    /// clippy docs link, whichever appears first.
    fn rustc(&mut self, line: &str) -> bool {
        if let Some(caps) = RUSTC_ISSUE.captures(line) {
            if RUSTC_SUMMARY.is_match(&caps[3]) {
                self.awaiting_location = None;
                return true;
            }
            let severity = if &caps[1] == "error" {
                Severity::Error
            } else {
                Severity::Warning
            };
            self.push(String::new(), 0, text(&caps, 2), severity);
            self.awaiting_location = Some(self.issues.len() - 1);
            return true;
        }
        self.locate(line) || self.name_pending_rule(line)
    }

    fn locate(&mut self, line: &str) -> bool {
        let Some(idx) = self.awaiting_location else {
            return false;
        };
        let Some(caps) = LOCATION.captures(line) else {
            return false;
        };
        if let Some(issue) = self.issues.get_mut(idx)
            && issue.file.is_empty()
        {
            issue.file = text(&caps, 1);
            issue.line = number(&caps, 2);
        }
        true
    }

    fn name_pending_rule(&mut self, line: &str) -> bool {
        let Some(issue) = self.awaiting_location.and_then(|i| self.issues.get_mut(i)) else {
            return false;
        };
        if !issue.rule.is_empty() {
            return false;
        }
        if let Some(caps) = LINT_ATTR.captures(line) {
            issue.rule = text(&caps, 1);
            return true;
        }
        if let Some(caps) = LINT_URL.captures(line) {
            issue.rule = format!("clippy::{}", &caps[1]);
            return true;
        }
        false
    }

    fn ruff(&mut self, line: &str) -> bool {
        let severity = |code: &str| {
            if code.starts_with('W') {
                Severity::Warning
            } else {
                Severity::Error
            }
        };
        if let Some(caps) = RUFF_CONCISE.captures(line) {
            self.push(text(&caps, 1), number(&caps, 2), text(&caps, 3), severity(&caps[3]));
            return true;
        }
        if let Some(caps) = RUFF_FULL.captures(line) {
            self.push(String::new(), 0, text(&caps, 1), severity(&caps[1]));
            self.awaiting_location = Some(self.issues.len() - 1);
            return true;
        }
        self.locate(line)
    }

    fn pylint(&mut self, line: &str) -> bool {
        let Some(caps) = PYLINT.captures(line) else {
            return false;
        };
        let severity = match &caps[3] {
            "E" | "F" => Severity::Error,
            _ => Severity::Warning,
        };
        self.push(text(&caps, 1), number(&caps, 2), text(&caps, 4), severity);
        true
    }

    fn mypy(&mut self, line: &str) -> bool {
        let Some(caps) = MYPY.captures(line) else {
            return false;
        };
        let severity = if &caps[3] == "error" {
            Severity::Error
        } else {
            Severity::Warning
        };
        self.push(text(&caps, 1), number(&caps, 2), text(&caps, 4), severity);
        true
    }

    fn golangci(&mut self, line: &str) -> bool {
        if let Some(caps) = GOLANGCI.captures(line) {
            self.push(text(&caps, 1), number(&caps, 2), text(&caps, 3), Severity::Error);
            return true;
        }
        if let Some(caps) = GO_VET.captures(line) {
            self.push(text(&caps, 1), number(&caps, 2), "vet".to_string(), Severity::Error);
            return true;
        }
        false
    }

    fn rubocop(&mut self, line: &str) -> bool {
        let Some(caps) = RUBOCOP.captures(line) else {
            return false;
        };
        let severity = match &caps[3] {
            "E" | "F" => Severity::Error,
            _ => Severity::Warning,
        };
        self.push(text(&caps, 1), number(&caps, 2), text(&caps, 4), severity);
        true
    }

    fn shellcheck(&mut self, line: &str) -> bool {
        let severity = |level: &str| {
            if level == "error" {
                Severity::Error
            } else {
                Severity::Warning
            }
        };
        if let Some(caps) = SHELLCHECK_GCC.captures(line) {
            self.push(text(&caps, 1), number(&caps, 2), text(&caps, 4), severity(&caps[3]));
            return true;
        }
        if let Some(caps) = SHELLCHECK_LOCATION.captures(line) {
            self.file = Some(text(&caps, 1));
            self.file_line = number(&caps, 2);
            return true;
        }
        if let Some(caps) = SHELLCHECK_MARK.captures(line)
            && let Some(file) = self.file.clone()
        {
            self.push(file, self.file_line, text(&caps, 1), severity(&caps[2]));
            return true;
        }
        false
    }

    fn finish(mut self) -> Vec<Issue> {
        for issue in &mut self.issues {
            if issue.file.is_empty() {
                issue.file = UNKNOWN_FILE.to_string();
            }
            if issue.rule.is_empty() {
                issue.rule = UNNAMED_RULE.to_string();
            }
        }
        self.issues
    }
}

/// Parse every issue `kind`'s profile recognizes. Other lines are ignored.
pub fn parse(kind: LinterKind, output: &str) -> Vec<Issue> {
    let rules = profile(kind);
    let mut parser = Parser::default();
    for line in output.lines() {
        for rule in rules {
            if rule(&mut parser, line) {
                break;
            }
        }
    }
    parser.finish()
}

/// `(name, count)` sorted by count descending, then name.
fn ranked<'a>(counts: HashMap<&'a str, usize>) -> Vec<(&'a str, usize)> {
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

/// Totals, top rules and top files.
pub fn render(issues: &[Issue]) -> String {
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;

    let mut by_rule: HashMap<&str, usize> = HashMap::new();
    let mut by_file: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
    for issue in issues {
        *by_rule.entry(&issue.rule).or_default() += 1;
        *by_file
            .entry(&issue.file)
            .or_default()
            .entry(&issue.rule)
            .or_default() += 1;
    }

    let icon = if errors > 0 { "✗" } else { "⚠" };
    let mut out = vec![format!(
        "{icon} Lint: {} ({}, {}) in {}",
        count_noun(issues.len(), "issue", "issues"),
        count_noun(errors, "error", "errors"),
        count_noun(warnings, "warning", "warnings"),
        count_noun(by_file.len(), "file", "files"),
    )];

    let rules = ranked(by_rule);
    out.push("Rules:".to_string());
    for (rule, n) in rules.iter().take(MAX_RULES) {
        out.push(format!("  {rule} ({n})"));
    }
    if rules.len() > MAX_RULES {
        out.push(format!("  +{} more rules", rules.len() - MAX_RULES));
    }

    let file_totals: HashMap<&str, usize> = by_file
        .iter()
        .map(|(file, rules)| (*file, rules.values().sum()))
        .collect();
    let files = ranked(file_totals);
    out.push("Files:".to_string());
    for (file, n) in files.iter().take(MAX_FILES) {
        let file_rules = by_file
            .get(file)
            .map(|r| ranked(r.clone()))
            .unwrap_or_default();
        let mut shown: Vec<String> = file_rules
            .iter()
            .take(RULES_PER_FILE)
            .map(|(rule, n)| format!("{rule} ×{n}"))
            .collect();
        if file_rules.len() > RULES_PER_FILE {
            shown.push(format!("+{} more", file_rules.len() - RULES_PER_FILE));
        }
        out.push(format!("  {file} ({n}): {}", shown.join(", ")));
    }
    if files.len() > MAX_FILES {
        out.push(format!("  +{} more files", files.len() - MAX_FILES));
    }

    out.join("\n")
}

/// Apply to output of a linter `command`. No issues and no clean signal
/// means the output is left alone as unparseable.
pub fn filter(command: &str, output: &str) -> Outcome {
    let Some(kind) = pattern::linter_kind(command) else {
        return Outcome::Inapplicable;
    };
    let issues = parse(kind, output);
    if issues.is_empty() {
        if CLEAN.is_match(output) {
            return Outcome::compare(output, "✓ Lint: no issues found".to_string());
        }
        return Outcome::Inapplicable;
    }
    Outcome::compare(output, render(&issues))
}
