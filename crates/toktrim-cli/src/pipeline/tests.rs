#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use toktrim_common::config::types::SourceLevel;

use super::*;

const CARGO_BUILD: &str = "\
\x1b[1m\x1b[32m   Compiling\x1b[0m serde v1.0.200
\x1b[1m\x1b[32m   Compiling\x1b[0m app v0.1.0 (/work/app)
\x1b[1m\x1b[32m    Finished\x1b[0m `dev` profile [unoptimized + debuginfo] target(s) in 2.5s
";

fn shell(command: &str) -> InvocationContext {
    InvocationContext::shell("bash", command, "s1")
}

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default())
}

#[test]
fn ansi_then_build_chain() {
    let out = pipeline().process(&shell("cargo build"), CARGO_BUILD);
    assert!(out.changed);
    assert_eq!(out.technique.as_deref(), Some("ansi,build"));
    assert_eq!(out.output, "✓ Build succeeded (2 units, 2.5s)");

    let record = out.record.unwrap();
    assert_eq!(record.session_id, "s1");
    assert_eq!(record.tool, "bash");
    assert_eq!(record.technique, "ansi,build");
    assert_eq!(record.original_chars, CARGO_BUILD.chars().count());
    assert_eq!(record.filtered_chars, out.output.chars().count());
    assert!(record.savings_percent > 50.0);
}

#[test]
fn unrecognized_output_passes_through() {
    let raw = "hello world\n";
    let out = pipeline().process(&shell("echo hello world"), raw);
    assert!(!out.changed);
    assert_eq!(out.output, raw);
    assert_eq!(out.technique, None);
    assert_eq!(out.record, None);
}

#[test]
fn disabled_pipeline_is_passthrough() {
    let mut config = PipelineConfig::default();
    config.enabled = false;
    let out = Pipeline::new(config).process(&shell("cargo build"), CARGO_BUILD);
    assert!(!out.changed);
    assert_eq!(out.output, CARGO_BUILD);
}

#[test]
fn disabled_stage_is_skipped() {
    let mut config = PipelineConfig::default();
    config.techniques.build.enabled = false;
    let out = Pipeline::new(config).process(&shell("cargo build"), CARGO_BUILD);
    assert_eq!(out.technique.as_deref(), Some("ansi"));
    assert!(out.output.contains("Compiling serde"));
}

#[test]
fn git_status_compacted() {
    let raw = " M src/lib.rs\nM  src/main.rs\n?? notes.txt\n";
    let out = pipeline().process(&shell("git status --porcelain"), raw);
    assert_eq!(out.technique.as_deref(), Some("git"));
    assert_eq!(
        out.output,
        "Staged (1): src/main.rs\nModified (1): src/lib.rs\nUntracked (1): notes.txt"
    );
}

#[test]
fn truncation_runs_last_for_any_tool() {
    let mut config = PipelineConfig::default();
    config.techniques.truncation.max_chars = 10;
    let ctx = InvocationContext {
        tool: "web_fetch".to_string(),
        origin: Origin::Other,
        session_id: "s1".to_string(),
    };
    let out = Pipeline::new(config).process(&ctx, "hello world");
    assert_eq!(out.technique.as_deref(), Some("truncation"));
    assert_eq!(out.output, "hello w\n... [truncated: 4 chars omitted]");
}

#[test]
fn file_reads_use_source_stages() {
    let mut config = PipelineConfig::default();
    config.techniques.source.enabled = true;
    config.techniques.source.level = SourceLevel::Minimal;
    let ctx = InvocationContext::file_read("read", "src/lib.rs", "s1");
    let raw = "// license banner\nfn main() {}\n";
    let out = Pipeline::new(config).process(&ctx, raw);
    assert_eq!(out.technique.as_deref(), Some("source-minimal"));
    assert_eq!(out.output, "fn main() {}");
}

#[test]
fn source_disabled_by_default() {
    let ctx = InvocationContext::file_read("read", "src/lib.rs", "s1");
    let raw = "// comment\nfn main() {}\n";
    let out = pipeline().process(&ctx, raw);
    assert!(!out.changed);
}

#[test]
fn structure_truncation_for_long_files() {
    let mut config = PipelineConfig::default();
    config.techniques.structure_truncation.max_lines = 10;
    let ctx = InvocationContext::file_read("read", "big.py", "s1");
    let raw: String = (0..40).map(|i| format!("x_{i} = {i}\n")).collect();
    let out = Pipeline::new(config).process(&ctx, &raw);
    assert_eq!(out.technique.as_deref(), Some("structure-truncation"));
    assert!(out.output.ends_with("[35 of 40 lines omitted]"));
}

#[test]
fn shell_filters_do_not_touch_file_reads() {
    let ctx = InvocationContext::file_read("read", "build.log", "s1");
    let out = pipeline().process(&ctx, "   Compiling a v0.1.0\n   Compiling b v0.1.0\n");
    assert!(!out.changed);
}

// --- fault handling ---

#[test]
fn panicking_stage_keeps_its_input() {
    let mut chain = Chain::new("original");
    chain.apply("upper", |t| Outcome::Changed(t.to_uppercase()));
    chain.apply("boom", |_| panic!("stage exploded"));
    chain.apply("suffix", |t| Outcome::Changed(format!("{t}!")));
    assert_eq!(chain.text, "ORIGINAL!");
    assert_eq!(chain.labels, vec!["upper", "suffix"]);
}

#[test]
fn unchanged_and_inapplicable_add_no_label() {
    let mut chain = Chain::new("text");
    chain.apply("a", |_| Outcome::Unchanged);
    chain.apply("b", |_| Outcome::Inapplicable);
    assert!(chain.labels.is_empty());
    assert_eq!(chain.text, "text");
}

#[test]
fn finish_without_change_records_nothing() {
    let chain = Chain::new("same");
    let out = chain.finish(&shell("ls"), "same");
    assert_eq!(out.record, None);
    assert!(!out.changed);
}

#[test]
fn empty_input_survives() {
    let out = pipeline().process(&shell("cargo build"), "");
    assert!(!out.changed);
    assert_eq!(out.output, "");
}

#[test]
fn install_then_test_goes_to_test_filter() {
    let raw = "\
added 312 packages in 4s
PASS src/other.test.js
FAIL src/sum.test.js
  ● sum › adds numbers

    Expected: 4
    Received: 5

Test Suites: 1 failed, 1 passed, 2 total
Tests:       1 failed, 3 passed, 4 total
Time:        0.512 s
";
    let out = pipeline().process(&shell("npm install && npm test"), raw);
    assert_eq!(out.technique.as_deref(), Some("test"));
    assert!(
        out.output.starts_with("✗ Tests: 3 passed, 1 failed"),
        "got: {}",
        out.output
    );
    assert!(!out.output.contains("Build succeeded"));
}

#[test]
fn build_then_test_reports_test_counts() {
    let raw = "\
   Compiling calc v0.1.0 (/work/calc)
    Finished `test` profile [unoptimized + debuginfo] target(s) in 0.90s
     Running unittests src/lib.rs (target/debug/deps/calc-1234)

running 2 tests
test tests::adds ... ok
test tests::subtracts ... FAILED

failures:

---- tests::subtracts stdout ----
thread 'tests::subtracts' panicked at src/lib.rs:21:9:
assertion failed

failures:
    tests::subtracts

test result: FAILED. 1 passed; 1 failed; 0 ignored; 0 measured; 0 filtered out; finished in 0.00s
";
    let out = pipeline().process(&shell("cargo build && cargo test"), raw);
    assert_eq!(out.technique.as_deref(), Some("test"));
    assert!(
        out.output.starts_with("✗ Tests: 1 passed, 1 failed"),
        "got: {}",
        out.output
    );
    assert!(out.output.contains("tests::subtracts"));
}
