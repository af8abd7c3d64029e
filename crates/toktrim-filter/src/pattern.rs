//! Command classification: which tool produced this output?
//!
//! A command string is split into simple segments (at `&&`, `||`, `;`, `|`
//! and newlines), each segment is normalized (leading `VAR=value` pairs and
//! wrapper words such as `sudo` or `npx` removed, the program reduced to its
//! basename) and then matched against the per-domain tables below. A
//! predicate holds if any segment matches.

use std::sync::LazyLock;

use regex::Regex;

/// Compile one of the crate's own patterns.
///
/// Every built-in pattern is exercised by the unit tests, so a failure here
/// can only come from editing a table.
#[allow(clippy::expect_used)]
pub(crate) fn builtin(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern must compile")
}

static SEGMENT_SPLIT: LazyLock<Regex> = LazyLock::new(|| builtin(r"\s*(?:&&|\|\||;|\||\n)\s*"));

static ENV_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| builtin(r"^[A-Za-z_][A-Za-z0-9_]*="));

/// Single-word wrappers that run the real command as their argument.
const WRAPPERS: &[&str] = &[
    "sudo", "time", "env", "nice", "nohup", "command", "exec", "npx", "bunx", "pnpx",
];

/// Two-word wrappers (`bundle exec rspec`, `uv run pytest`).
const WRAPPER_PAIRS: &[(&str, &str)] = &[
    ("pnpm", "exec"),
    ("pnpm", "dlx"),
    ("yarn", "dlx"),
    ("bundle", "exec"),
    ("uv", "run"),
    ("poetry", "run"),
    ("pipenv", "run"),
];

static BUILD: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^(?:
            cargo\s+(?:build|b|check|c|install|rustc|doc)\b
          | (?:npm|pnpm|yarn|bun)\s+(?:run\s+)?build\b
          | (?:npm|pnpm|bun)\s+(?:install|i|ci|add|update)\b
          | yarn(?:\s+(?:install|add|upgrade)\b.*)?$
          | (?:make|gmake|ninja|cmake|meson|bazel|buck2?|scons)\b
          | (?:gradle|gradlew|mvn|mvnw|ant|sbt)\b
          | go\s+(?:build|install|get|generate|mod\s+(?:download|tidy))\b
          | (?:tsc|webpack|rollup|esbuild|parcel)\b
          | (?:vite|next|nuxt|astro)\s+build\b
          | dotnet\s+(?:build|publish|restore)\b
          | swift\s+build\b
          | pip3?\s+install\b
          | python3?\s+-m\s+pip\s+install\b
          | poetry\s+(?:install|build|lock)\b
          | uv\s+(?:sync|build|pip\s+install)\b
          | bundle(?:\s+install\b.*)?$
          | gem\s+install\b
          | composer\s+(?:install|update|require)\b
          | (?:gcc|g\+\+|clang|clang\+\+|cc|c\+\+|javac|rustc)\b
          | zig\s+build\b
          | mix\s+(?:compile|deps\.get)\b
          | docker\s+(?:build|compose\s+build)\b
        )",
    )
});

static TEST: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^(?:
            cargo\s+(?:test|t|nextest)\b
          | (?:npm|pnpm|yarn|bun)\s+(?:run\s+)?test\b
          | (?:jest|vitest|mocha|ava|jasmine|karma|tap)\b
          | (?:playwright|cypress)\s+(?:test|run)\b
          | (?:pytest|py\.test|tox|nox)\b
          | python3?\s+-m\s+(?:pytest|unittest)\b
          | go\s+test\b
          | (?:mvn|mvnw|gradle|gradlew|sbt)\b.*\btest\b
          | dotnet\s+test\b
          | (?:rspec|phpunit|ctest)\b
          | rake\s+(?:test|spec)\b
          | (?:mix|deno|bun|swift)\s+test\b
          | zig\s+build\s+test\b
        )",
    )
});

static LINT: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"(?x)^(?:
            eslint\b
          | cargo\s+clippy\b
          | ruff\b
          | (?:flake8|pylint|mypy|pyright|tslint|stylelint|shellcheck|hadolint|rubocop|staticcheck)\b
          | golangci-lint\b
          | go\s+vet\b
          | biome\s+(?:lint|check)\b
          | (?:npm|pnpm|yarn|bun)\s+(?:run\s+)?lint\b
          | next\s+lint\b
          | markdownlint\b
        )",
    )
});

static SEARCH: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^(?:grep|egrep|fgrep|rg|ag|ack|ugrep|findstr|git\s+grep)\b")
});

/// Linter identity, used to choose a parser profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinterKind {
    Eslint,
    Clippy,
    /// ruff and flake8 share `file:line:col: CODE message`.
    Ruff,
    Pylint,
    Mypy,
    Golangci,
    Rubocop,
    Shellcheck,
    /// Anything else: try every profile.
    Generic,
}

/// Reduce `/usr/bin/git` or `./gradlew` to the program name.
fn basename(word: &str) -> &str {
    word.rfind(['/', '\\']).map_or(word, |pos| &word[pos + 1..])
}

/// Normalize one simple command: drop env assignments and wrappers,
/// basename the program, and rejoin with single spaces.
fn normalize_segment(segment: &str) -> String {
    let mut words: Vec<&str> = segment.split_whitespace().collect();

    loop {
        let before = words.len();
        while words.first().is_some_and(|w| ENV_ASSIGNMENT.is_match(w)) {
            words.remove(0);
        }
        if let Some(first) = words.first().copied().map(basename) {
            if WRAPPERS.contains(&first) {
                words.remove(0);
                // `env -i`, `nice -n 10` style options.
                while words.first().is_some_and(|w| w.starts_with('-')) {
                    words.remove(0);
                    if words
                        .first()
                        .is_some_and(|w| w.chars().all(|c| c.is_ascii_digit()))
                    {
                        words.remove(0);
                    }
                }
            } else if first == "timeout" {
                words.remove(0);
                if !words.is_empty() {
                    words.remove(0);
                }
            } else if words.len() >= 2 && WRAPPER_PAIRS.contains(&(first, words[1])) {
                words.drain(..2);
            }
        }
        if words.len() == before {
            break;
        }
    }

    let mut out = String::new();
    for (i, w) in words.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(if i == 0 { basename(w) } else { w });
    }
    out
}

/// Simple commands contained in `command`, normalized.
pub fn segments(command: &str) -> Vec<String> {
    SEGMENT_SPLIT
        .split(command.trim())
        .map(normalize_segment)
        .filter(|s| !s.is_empty())
        .collect()
}

fn any_segment(command: &str, pred: impl Fn(&str) -> bool) -> bool {
    segments(command).iter().any(|s| pred(s))
}

/// Package managers, compilers and build systems. Test and lint invocations
/// of the same tools (`mvn test`, `cargo clippy`) are excluded, and so is
/// any compound command with a test or lint segment (`cargo build && cargo
/// test`): its output belongs to the more specific filter.
pub fn is_build_command(command: &str) -> bool {
    let segments = segments(command);
    segments.iter().any(|s| BUILD.is_match(s))
        && !segments.iter().any(|s| TEST.is_match(s) || LINT.is_match(s))
}

pub fn is_test_command(command: &str) -> bool {
    any_segment(command, |s| TEST.is_match(s))
}

pub fn is_linter_command(command: &str) -> bool {
    any_segment(command, |s| LINT.is_match(s))
}

pub fn is_search_command(command: &str) -> bool {
    any_segment(command, |s| SEARCH.is_match(s))
}

/// Identity of the first linter found in `command`.
pub fn linter_kind(command: &str) -> Option<LinterKind> {
    segments(command)
        .iter()
        .find(|s| LINT.is_match(s))
        .map(|s| {
            let mut words = s.split_whitespace();
            match (words.next(), words.next()) {
                (Some("eslint"), _) => LinterKind::Eslint,
                (Some("cargo"), Some("clippy")) => LinterKind::Clippy,
                (Some("ruff" | "flake8"), _) => LinterKind::Ruff,
                (Some("pylint"), _) => LinterKind::Pylint,
                (Some("mypy"), _) => LinterKind::Mypy,
                (Some("golangci-lint"), _) => LinterKind::Golangci,
                (Some("rubocop"), _) => LinterKind::Rubocop,
                (Some("shellcheck"), _) => LinterKind::Shellcheck,
                _ => LinterKind::Generic,
            }
        })
}

/// Git global options that take a separate value word.
const GIT_VALUE_FLAGS: &[&str] = &["-C", "-c", "--git-dir", "--work-tree", "--namespace"];

/// The git subcommand of the first `git` segment, skipping global options
/// (`git -C repo --no-pager log` → `log`).
pub fn git_subcommand(command: &str) -> Option<String> {
    segments(command).into_iter().find_map(|seg| {
        let mut words = seg.split_whitespace();
        if words.next()? != "git" {
            return None;
        }
        while let Some(word) = words.next() {
            if GIT_VALUE_FLAGS.contains(&word) {
                words.next();
            } else if !word.starts_with('-') {
                return Some(word.to_string());
            }
        }
        None
    })
}
