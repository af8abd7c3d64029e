//! Cut a file to a line budget without losing its outline.
//!
//! Imports, exports, declaration signatures and brace-only lines are always
//! kept, and so are decorators in indentation-scoped languages. Other lines
//! fill half the budget in file order; everything after that is replaced by
//! `... N lines omitted` markers.

use std::borrow::Cow;

use super::Language;
use super::shape::{is_brace_only, is_import, is_signature};

fn is_important(line: &str, lang: &Language) -> bool {
    is_import(line)
        || is_signature(line)
        || is_brace_only(line)
        || (lang.indent_blocks && line.trim_start().starts_with('@'))
}

/// `text` reduced to roughly `max_lines`. Borrowed when already within it.
pub fn smart_truncate<'a>(text: &'a str, max_lines: usize, lang: &Language) -> Cow<'a, str> {
    let total = text.lines().count();
    if total <= max_lines {
        return Cow::Borrowed(text);
    }

    let filler_budget = max_lines / 2;
    let mut filler = 0;
    let mut run = 0;
    let mut omitted = 0;
    let mut out: Vec<Cow<'_, str>> = Vec::new();
    for line in text.lines() {
        let keep = if is_important(line, lang) {
            true
        } else if filler < filler_budget {
            filler += 1;
            true
        } else {
            false
        };
        if !keep {
            run += 1;
            omitted += 1;
            continue;
        }
        if run > 0 {
            out.push(Cow::Owned(format!("... {run} lines omitted")));
            run = 0;
        }
        out.push(Cow::Borrowed(line));
    }
    if run > 0 {
        out.push(Cow::Owned(format!("... {run} lines omitted")));
    }
    out.push(Cow::Owned(format!(
        "[{omitted} of {total} lines omitted]"
    )));
    Cow::Owned(out.join("\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::language_for;
    use super::*;

    fn rust() -> &'static Language {
        language_for("lib.rs").unwrap()
    }

    #[test]
    fn within_budget_is_borrowed() {
        let text = "fn a() {}\nfn b() {}";
        assert!(matches!(smart_truncate(text, 10, rust()), Cow::Borrowed(_)));
    }

    #[test]
    fn signatures_survive_the_cut() {
        let mut text = String::from("use std::io;\n");
        for f in 0..5 {
            text.push_str(&format!("fn f{f}() {{\n"));
            for i in 0..10 {
                text.push_str(&format!("    let v{i} = {i};\n"));
            }
            text.push_str("}\n");
        }
        let out = smart_truncate(&text, 20, rust());
        for f in 0..5 {
            assert!(out.contains(&format!("fn f{f}() {{")), "missing f{f}: {out}");
        }
        assert!(out.contains("use std::io;"));
        assert!(out.contains("... 10 lines omitted"));
        assert!(out.ends_with("[40 of 61 lines omitted]"), "got: {out}");
    }

    #[test]
    fn filler_fills_half_the_budget_in_order() {
        let text: String = (0..30).map(|i| format!("x{i}\n")).collect();
        let out = smart_truncate(&text, 10, rust());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(&lines[..5], &["x0", "x1", "x2", "x3", "x4"]);
        assert_eq!(lines[5], "... 25 lines omitted");
        assert_eq!(lines[6], "[25 of 30 lines omitted]");
    }
}
