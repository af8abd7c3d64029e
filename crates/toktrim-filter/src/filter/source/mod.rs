//! Source file reduction, keyed off the file extension.
//!
//! - [`minimal`] strips comments (keeping doc comments and docstrings) and
//!   squeezes blank runs.
//! - [`aggressive`] keeps only imports, exports, top-level constants and
//!   declaration signatures, with function bodies collapsed to `...`.
//! - [`structure`] cuts a file down to a line budget while keeping the lines
//!   that carry its shape.
//!
//! Files with an unknown extension are never touched.

pub mod aggressive;
pub mod minimal;
mod shape;
pub mod structure;

use std::path::Path;

use toktrim_common::config::types::SourceLevel;

use crate::Outcome;

/// How a string literal opens and closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub open: &'static str,
    pub close: &'static str,
    pub multiline: bool,
}

const fn quote(delim: &'static str, multiline: bool) -> Quote {
    Quote {
        open: delim,
        close: delim,
        multiline,
    }
}

/// Comment and string syntax of one language family.
#[derive(Debug)]
pub struct Language {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Line-comment prefixes that are documentation and survive stripping.
    pub doc_line_prefixes: &'static [&'static str],
    /// Block-comment openers that are documentation (`/**`, `/*!`).
    pub doc_block_prefixes: &'static [&'static str],
    /// Longest delimiters first.
    pub quotes: &'static [Quote],
    /// `'` starts a char literal only when it looks like one (`'a'`, `'\n'`).
    pub lifetimes: bool,
    /// Blocks are delimited by indentation and a trailing `:`.
    pub indent_blocks: bool,
}

const C_QUOTES: &[Quote] = &[quote("\"", false), quote("'", false)];
const JS_QUOTES: &[Quote] = &[quote("`", true), quote("\"", false), quote("'", false)];
const PY_QUOTES: &[Quote] = &[
    quote("\"\"\"", true),
    quote("'''", true),
    quote("\"", false),
    quote("'", false),
];
const RUST_QUOTES: &[Quote] = &[quote("\"", true), quote("'", false)];
const GO_QUOTES: &[Quote] = &[quote("`", true), quote("\"", false), quote("'", false)];

const SLASH_DOCS: &[&str] = &["///", "//!"];
const STAR_DOCS: &[&str] = &["/**", "/*!"];

pub static LANGUAGES: &[Language] = &[
    Language {
        name: "rust",
        extensions: &["rs"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        doc_line_prefixes: SLASH_DOCS,
        doc_block_prefixes: STAR_DOCS,
        quotes: RUST_QUOTES,
        lifetimes: true,
        indent_blocks: false,
    },
    Language {
        name: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        doc_line_prefixes: &["///"],
        doc_block_prefixes: STAR_DOCS,
        quotes: JS_QUOTES,
        lifetimes: false,
        indent_blocks: false,
    },
    Language {
        name: "go",
        extensions: &["go"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        doc_line_prefixes: &[],
        doc_block_prefixes: STAR_DOCS,
        quotes: GO_QUOTES,
        lifetimes: false,
        indent_blocks: false,
    },
    Language {
        name: "c-family",
        extensions: &[
            "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "java", "kt", "kts", "scala", "swift",
            "cs", "dart", "php",
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        doc_line_prefixes: &["///"],
        doc_block_prefixes: STAR_DOCS,
        quotes: C_QUOTES,
        lifetimes: false,
        indent_blocks: false,
    },
    Language {
        name: "python",
        extensions: &["py", "pyi"],
        line_comments: &["#"],
        block_comment: None,
        doc_line_prefixes: &[],
        doc_block_prefixes: &[],
        quotes: PY_QUOTES,
        lifetimes: false,
        indent_blocks: true,
    },
    Language {
        name: "ruby",
        extensions: &["rb", "rake"],
        line_comments: &["#"],
        block_comment: None,
        doc_line_prefixes: &[],
        doc_block_prefixes: &[],
        quotes: C_QUOTES,
        lifetimes: false,
        indent_blocks: false,
    },
    Language {
        name: "shell",
        extensions: &["sh", "bash", "zsh"],
        line_comments: &["#"],
        block_comment: None,
        doc_line_prefixes: &[],
        doc_block_prefixes: &[],
        quotes: C_QUOTES,
        lifetimes: false,
        indent_blocks: false,
    },
    Language {
        name: "lua",
        extensions: &["lua"],
        line_comments: &["--"],
        block_comment: Some(("--[[", "]]")),
        doc_line_prefixes: &["---"],
        doc_block_prefixes: &[],
        quotes: C_QUOTES,
        lifetimes: false,
        indent_blocks: false,
    },
    Language {
        name: "sql",
        extensions: &["sql"],
        line_comments: &["--"],
        block_comment: Some(("/*", "*/")),
        doc_line_prefixes: &[],
        doc_block_prefixes: &[],
        quotes: C_QUOTES,
        lifetimes: false,
        indent_blocks: false,
    },
    Language {
        name: "haskell",
        extensions: &["hs"],
        line_comments: &["--"],
        block_comment: Some(("{-", "-}")),
        doc_line_prefixes: &["-- |", "-- ^"],
        doc_block_prefixes: &["{-|"],
        quotes: &[quote("\"", false)],
        lifetimes: false,
        indent_blocks: false,
    },
];

/// Language for `path` by its extension, case-insensitively.
pub fn language_for(path: &str) -> Option<&'static Language> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|lang| lang.extensions.contains(&ext.as_str()))
}

/// Minimal or aggressive reduction of the file at `path`.
pub fn filter(path: &str, text: &str, level: SourceLevel) -> Outcome {
    let Some(lang) = language_for(path) else {
        return Outcome::Inapplicable;
    };
    let reduced = match level {
        SourceLevel::Minimal => minimal::minimal(text, lang),
        SourceLevel::Aggressive => aggressive::aggressive(text, lang),
    };
    if reduced == text.trim() {
        return Outcome::Unchanged;
    }
    Outcome::Changed(reduced)
}

/// Structure-aware truncation of the file at `path` to `max_lines`.
pub fn truncate_structure(path: &str, text: &str, max_lines: usize) -> Outcome {
    let Some(lang) = language_for(path) else {
        return Outcome::Inapplicable;
    };
    match structure::smart_truncate(text, max_lines, lang) {
        std::borrow::Cow::Borrowed(_) => Outcome::Unchanged,
        std::borrow::Cow::Owned(s) => Outcome::compare(text, s),
    }
}

#[cfg(test)]
mod tests;
