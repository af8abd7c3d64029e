//! Hard character cap.

use std::borrow::Cow;

use crate::Outcome;

/// Characters reserved at the cut for the omission marker.
const RESERVED: usize = 3;

/// Cap `text` at `max_chars` characters.
///
/// Text within the budget is returned borrowed. Otherwise the first
/// `max_chars - 3` characters are kept, followed by a newline and
/// `... [truncated: N chars omitted]`. Budgets below 3 leave only `...`.
pub fn truncate(text: &str, max_chars: usize) -> Cow<'_, str> {
    let total = text.chars().count();
    if total <= max_chars {
        return Cow::Borrowed(text);
    }
    if max_chars < RESERVED {
        return Cow::Borrowed("...");
    }

    let keep = max_chars - RESERVED;
    let cut = text.char_indices().nth(keep).map_or(text.len(), |(i, _)| i);
    let omitted = total - keep;
    Cow::Owned(format!(
        "{}\n... [truncated: {omitted} chars omitted]",
        &text[..cut]
    ))
}

pub fn filter(text: &str, max_chars: usize) -> Outcome {
    match truncate(text, max_chars) {
        Cow::Borrowed(kept) if kept == text => Outcome::Unchanged,
        other => Outcome::Changed(other.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world_example() {
        assert_eq!(
            truncate("hello world", 10),
            "hello w\n... [truncated: 4 chars omitted]"
        );
    }

    #[test]
    fn within_budget_unchanged() {
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello", 100), "hello");
        assert_eq!(truncate("", 0), "");
        assert_eq!(filter("hello", 5), Outcome::Unchanged);
    }

    #[test]
    fn tiny_budget_is_just_marker() {
        assert_eq!(truncate("hello", 2), "...");
        assert_eq!(truncate("hello", 0), "...");
    }

    #[test]
    fn kept_prefix_fits_budget() {
        let text = "x".repeat(500);
        for n in [3, 4, 10, 99, 499] {
            let out = truncate(&text, n);
            let kept = out.split('\n').next().unwrap_or_default();
            assert_eq!(kept.chars().count(), n - 3, "budget {n}");
            assert!(out.ends_with(&format!("[truncated: {} chars omitted]", 500 - (n - 3))));
        }
    }

    #[test]
    fn multibyte_boundaries() {
        let out = truncate("ééééééé", 5);
        assert_eq!(out, "éé\n... [truncated: 5 chars omitted]");
    }

    #[test]
    fn deterministic() {
        let text = "abc ".repeat(50);
        assert_eq!(truncate(&text, 40), truncate(&text, 40));
    }

    #[test]
    fn filter_changes_long_text() {
        assert!(matches!(filter("hello world", 10), Outcome::Changed(_)));
        assert_eq!(filter("ab", 1), Outcome::Changed("...".to_string()));
    }
}
