//! Terminal escape sequence removal.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::Outcome;
use crate::pattern::builtin;

const ESC: char = '\x1b';

/// CSI (`ESC [ … final`), OSC (`ESC ] … BEL` or `ESC ] … ESC \`), charset
/// selection (`ESC ( B`) and two-byte Fe escapes.
static SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    builtin(
        r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[()][0-9A-Za-z]|\x1b[@-Z\\-_]",
    )
});

/// Remove escape sequences from `text`.
///
/// Any escape character that is not part of a recognized sequence is dropped
/// as well, so the result never contains `ESC` and stripping is idempotent.
/// Text without an escape character is returned borrowed.
pub fn strip(text: &str) -> Cow<'_, str> {
    if !text.contains(ESC) {
        return Cow::Borrowed(text);
    }
    let stripped = SEQUENCE.replace_all(text, "");
    Cow::Owned(stripped.replace(ESC, ""))
}

pub fn filter(text: &str) -> Outcome {
    match strip(text) {
        Cow::Borrowed(_) => Outcome::Unchanged,
        Cow::Owned(s) => Outcome::compare(text, s),
    }
}
