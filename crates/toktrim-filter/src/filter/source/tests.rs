#![allow(clippy::unwrap_used, clippy::expect_used)]

use toktrim_common::config::types::SourceLevel;

use super::*;

const RUST_SAMPLE: &str = "\
//! Geometry helpers.
use std::f64::consts::PI;

// Unit circle radius.
const RADIUS: f64 = 1.0;

/// Circle area.
pub fn area(r: f64) -> f64 {
    // pi r squared
    PI * r * r
}
";

#[test]
fn language_lookup_is_case_insensitive() {
    assert_eq!(language_for("SRC/MAIN.RS").unwrap().name, "rust");
    assert_eq!(language_for("app.tsx").unwrap().name, "javascript");
    assert!(language_for("README").is_none());
    assert!(language_for("notes.txt").is_none());
}

#[test]
fn unknown_extension_is_inapplicable() {
    assert_eq!(
        filter("notes.txt", "# heading\ntext", SourceLevel::Aggressive),
        Outcome::Inapplicable
    );
    assert_eq!(
        truncate_structure("data.csv", "a,b\n1,2", 1),
        Outcome::Inapplicable
    );
}

#[test]
fn minimal_strips_plain_comments() {
    let out = filter("geo.rs", RUST_SAMPLE, SourceLevel::Minimal)
        .changed()
        .unwrap();
    assert!(out.contains("//! Geometry helpers."));
    assert!(out.contains("/// Circle area."));
    assert!(!out.contains("Unit circle radius"));
    assert!(!out.contains("pi r squared"));
}

#[test]
fn comment_free_file_is_unchanged() {
    let text = "fn main() {\n    run();\n}\n";
    assert_eq!(filter("main.rs", text, SourceLevel::Minimal), Outcome::Unchanged);
}

#[test]
fn aggressive_keeps_outline_only() {
    let out = filter("geo.rs", RUST_SAMPLE, SourceLevel::Aggressive)
        .changed()
        .unwrap();
    assert_eq!(
        out,
        "use std::f64::consts::PI;\nconst RADIUS: f64 = 1.0;\npub fn area(r: f64) -> f64 {\n    ...\n}"
    );
}

#[test]
fn structure_truncation_respects_budget() {
    let text: String = std::iter::once("import os\n".to_string())
        .chain((0..100).map(|i| format!("value_{i} = {i}\n")))
        .collect();
    let out = truncate_structure("big.py", &text, 20).changed().unwrap();
    assert!(out.starts_with("import os\nvalue_0 = 0"));
    assert!(out.contains("... 90 lines omitted"));
    assert!(out.ends_with("[90 of 101 lines omitted]"));
}

#[test]
fn structure_truncation_within_budget_is_unchanged() {
    assert_eq!(
        truncate_structure("small.go", "package main\n\nfunc main() {}\n", 50),
        Outcome::Unchanged
    );
}
