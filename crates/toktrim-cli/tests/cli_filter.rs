#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const CARGO_BUILD: &str = "   Compiling a v0.1.0\n   Compiling b v0.1.0\n    Finished `dev` profile [unoptimized + debuginfo] target(s) in 2.5s\n";

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// A `toktrim` command isolated inside `home`: no user config, no shared
/// metrics log, no inherited session.
fn toktrim(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_toktrim"));
    cmd.current_dir(home)
        .env("TOKTRIM_HOME", home)
        .env_remove("TOKTRIM_CONFIG")
        .env_remove("TOKTRIM_METRICS_PATH")
        .env_remove("TOKTRIM_SESSION")
        .env_remove("TOKTRIM_LOG");
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn toktrim");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn filter(home: &Path, command: &str, session: &str, input: &str) -> Output {
    let mut cmd = toktrim(home);
    cmd.args(["filter", "--command", command, "--session", session]);
    run_with_stdin(cmd, input)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// --- filter ---

#[test]
fn filter_compacts_build_output() {
    let home = TempDir::new().unwrap();
    let out = filter(home.path(), "cargo build", "s1", CARGO_BUILD);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "✓ Build succeeded (2 units, 2.5s)\n");
}

#[test]
fn filter_passes_unknown_output_through() {
    let home = TempDir::new().unwrap();
    let out = filter(home.path(), "echo hi", "s1", "hi there\n");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "hi there\n");
    assert!(!home.path().join("metrics.jsonl").exists());
}

#[test]
fn filter_requires_an_origin() {
    let home = TempDir::new().unwrap();
    let mut cmd = toktrim(home.path());
    cmd.args(["filter"]);
    let out = run_with_stdin(cmd, "x\n");
    assert!(!out.status.success());
}

#[test]
fn filter_rejects_both_origins() {
    let home = TempDir::new().unwrap();
    let mut cmd = toktrim(home.path());
    cmd.args(["filter", "--command", "ls", "--file", "a.rs"]);
    let out = run_with_stdin(cmd, "x\n");
    assert!(!out.status.success());
}

#[test]
fn filter_verbose_reports_technique() {
    let home = TempDir::new().unwrap();
    let mut cmd = toktrim(home.path());
    cmd.args(["--verbose", "filter", "--command", "cargo build"]);
    let out = run_with_stdin(cmd, CARGO_BUILD);
    let err = stderr(&out);
    assert!(err.contains("[toktrim] build:"), "stderr: {err}");
    assert!(err.contains("% saved)"));
}

#[test]
fn filter_appends_metrics_record() {
    let home = TempDir::new().unwrap();
    filter(home.path(), "cargo build", "chat-1", CARGO_BUILD);
    let log = std::fs::read_to_string(home.path().join("metrics.jsonl")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["sessionId"], "chat-1");
    assert_eq!(record["technique"], "build");
    assert_eq!(record["tool"], "bash");
}

#[test]
fn filter_metrics_path_override() {
    let home = TempDir::new().unwrap();
    let custom = home.path().join("custom").join("m.jsonl");
    let mut cmd = toktrim(home.path());
    cmd.env("TOKTRIM_METRICS_PATH", &custom)
        .args(["filter", "--command", "cargo build"]);
    run_with_stdin(cmd, CARGO_BUILD);
    assert!(custom.exists());
    assert!(!home.path().join("metrics.jsonl").exists());
}

#[test]
fn notification_after_cadence_turns() {
    let home = TempDir::new().unwrap();
    for turn in 1..=4 {
        let out = filter(home.path(), "cargo build", "chat-2", CARGO_BUILD);
        assert!(
            !stderr(&out).contains("toktrim: saved"),
            "early notification on turn {turn}"
        );
    }
    let out = filter(home.path(), "cargo build", "chat-2", CARGO_BUILD);
    let err = stderr(&out);
    assert!(err.contains("[toktrim] toktrim: saved"), "stderr: {err}");
    assert!(err.contains("over 5 calls"));
    assert!(err.contains("build"));
}

#[test]
fn notification_cadence_from_project_config() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".toktrim");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        "[notifications]\nupdateCadence = 1\n",
    )
    .unwrap();
    let out = filter(home.path(), "cargo build", "chat-3", CARGO_BUILD);
    assert!(stderr(&out).contains("over 1 calls"), "stderr: {}", stderr(&out));
}

#[test]
fn disabled_pipeline_from_config_flag() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("off.toml");
    std::fs::write(&config, "enabled = false\n").unwrap();
    let mut cmd = toktrim(home.path());
    cmd.arg("--config")
        .arg(&config)
        .args(["filter", "--command", "cargo build"]);
    let out = run_with_stdin(cmd, CARGO_BUILD);
    assert_eq!(stdout(&out), CARGO_BUILD);
}

// --- test ---

#[test]
fn test_subcommand_filters_fixture() {
    let home = TempDir::new().unwrap();
    let out = toktrim(home.path())
        .args([
            "test",
            &fixture_path("cargo_test_failure.txt"),
            "--command",
            "cargo test",
        ])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("✗ Tests: 5 passed, 2 failed"));
    assert!(!home.path().join("metrics.jsonl").exists());
}

#[test]
fn test_subcommand_missing_fixture_fails() {
    let home = TempDir::new().unwrap();
    let out = toktrim(home.path())
        .args(["test", "nope.txt", "--command", "cargo test"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("[toktrim] error: failed to read fixture"));
}

// --- gain ---

#[test]
fn gain_with_empty_log() {
    let home = TempDir::new().unwrap();
    let out = toktrim(home.path()).args(["gain"]).output().unwrap();
    assert!(out.status.success());
    assert!(stdout(&out).contains("invocations:    0"));
}

#[test]
fn gain_json_for_one_session() {
    let home = TempDir::new().unwrap();
    filter(home.path(), "cargo build", "a", CARGO_BUILD);
    filter(home.path(), "cargo build", "a", CARGO_BUILD);
    filter(home.path(), "cargo build", "b", CARGO_BUILD);

    let out = toktrim(home.path())
        .args(["gain", "--session", "a", "--json"])
        .output()
        .unwrap();
    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["session_id"], "a");
    assert_eq!(summary["invocations"], 2);
    assert_eq!(summary["by_technique"][0]["technique"], "build");
}

#[test]
fn gain_by_session() {
    let home = TempDir::new().unwrap();
    filter(home.path(), "cargo build", "a", CARGO_BUILD);
    filter(home.path(), "cargo build", "b", CARGO_BUILD);

    let out = toktrim(home.path())
        .args(["gain", "--by-session"])
        .output()
        .unwrap();
    let text = stdout(&out);
    assert!(text.contains("toktrim savings (session a)"), "got: {text}");
    assert!(text.contains("toktrim savings (session b)"));
}

// --- config ---

#[test]
fn config_json_shows_defaults() {
    let home = TempDir::new().unwrap();
    let out = toktrim(home.path())
        .args(["config", "--json"])
        .output()
        .unwrap();
    let cfg: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(cfg["enabled"], true);
    assert_eq!(cfg["notifications"]["updateCadence"], 5);
    assert_eq!(cfg["techniques"]["source"]["enabled"], false);
}

#[test]
fn config_toml_reflects_user_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "[techniques.truncation]\nmaxChars = 5000\n",
    )
    .unwrap();
    let out = toktrim(home.path()).args(["config"]).output().unwrap();
    let text = stdout(&out);
    assert!(text.contains("maxChars = 5000"), "got: {text}");
}
