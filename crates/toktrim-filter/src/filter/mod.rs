//! Content-classifying filters.
//!
//! Every filter is a pure function from (command or path, text) to
//! [`Outcome`](crate::Outcome). None of them return errors: input a filter
//! cannot make sense of yields `Inapplicable` or `Unchanged`.

pub mod ansi;
pub mod build;
pub mod git;
pub mod lint;
pub mod search;
pub mod source;
pub mod test_run;
pub mod truncate;

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::pattern::builtin;

/// Report headers the filters themselves emit.
static GENERATED_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    builtin(r"^(?:[✓⚠] Build succeeded\b|✗ Build failed:|[✓✗] Tests: |[✓✗⚠] Lint: )")
});

/// Whether `line` is a header written by one of these filters rather than
/// by the tool that produced the output.
pub fn is_generated_header(line: &str) -> bool {
    GENERATED_HEADER.is_match(line)
}

/// Cap `line` at `width` characters, marking the cut with `…`.
pub fn clip(line: &str, width: usize) -> Cow<'_, str> {
    match line.char_indices().nth(width.saturating_sub(1)) {
        Some((cut, _)) if line.chars().count() > width => {
            Cow::Owned(format!("{}…", &line[..cut]))
        }
        _ => Cow::Borrowed(line),
    }
}

/// `"1 error"`, `"3 errors"`.
pub(crate) fn count_noun(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}
