//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run with HOME pointed at a scratch
//! directory, so config, drafts and the practice log start empty.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "stillpoint-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("STILLPOINT_ENV")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_practice_list() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(home.path(), &["practice", "list"]);
    assert_eq!(code, 0, "practice list failed");
    assert!(out.contains("4-6-breathing"));
    assert!(out.contains("4-4-4-breathing"));
}

#[test]
fn test_practice_list_json() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(home.path(), &["practice", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed.as_array().is_some_and(|v| v.len() >= 2));
}

#[test]
fn test_practice_phase() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(home.path(), &["practice", "phase", "4-6-breathing", "4"]);
    assert_eq!(code, 0);
    let phase: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(phase["kind"], "exhale");
    assert_eq!(phase["seconds_remaining"], 6);
}

#[test]
fn test_unknown_variant_fails() {
    let home = TempDir::new().unwrap();
    let (_, err, code) = run_cli(home.path(), &["practice", "phase", "box-breathing", "0"]);
    assert_eq!(code, 1);
    assert!(err.contains("error:"));
}

#[test]
fn test_config_set_and_get() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(home.path(), &["config", "get", "audio.volume"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "80");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "audio.volume", "35"]);
    assert_eq!(code, 0);
    let (out, _, _) = run_cli(home.path(), &["config", "get", "audio.volume"]);
    assert_eq!(out.trim(), "35");
}

#[test]
fn test_config_unknown_key() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "get", "audio.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_interrupted_run_leaves_draft_then_resumes() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(
        home.path(),
        &["practice", "run", "--offline", "--stop-after", "12"],
    );
    assert_eq!(code, 0, "practice run failed");
    assert!(out.contains("stopped at 12s"));

    let (out, _, code) = run_cli(home.path(), &["draft", "show"]);
    assert_eq!(code, 0);
    let draft: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(draft["session"]["elapsed_secs"], 12);
    assert_eq!(draft["session"]["variant_id"], "4-6-breathing");

    let (out, _, code) = run_cli(
        home.path(),
        &["practice", "run", "--offline", "--skip-mood"],
    );
    assert_eq!(code, 0);
    assert!(out.contains("resuming draft"));
    assert!(out.contains("completed 300s"));

    let (out, _, _) = run_cli(home.path(), &["draft", "show"]);
    assert_eq!(out.trim(), "no draft");

    let (out, _, code) = run_cli(home.path(), &["stats", "all"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["total_secs"], 300);
}

#[test]
fn test_quick_run_completes() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(
        home.path(),
        &["practice", "run", "--offline", "--quick", "--variant", "4-7-8-breathing"],
    );
    assert_eq!(code, 0);
    assert!(out.contains("page: practice"));
    assert!(out.contains("completed"));
    assert!(!out.contains("emotion-check"));
}

#[test]
fn test_draft_clear_when_empty() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(home.path(), &["draft", "clear"]);
    assert_eq!(code, 0);
    assert!(out.contains("draft cleared"));
}

#[test]
fn test_mood_score_rejected_offline() {
    let home = TempDir::new().unwrap();
    let (_, err, code) = run_cli(home.path(), &["mood", "record", "9"]);
    assert_eq!(code, 1);
    assert!(err.contains("mood_score"));
}
