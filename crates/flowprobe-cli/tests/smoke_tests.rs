//! Smoke tests for the flowprobe binary
//!
//! Nothing here launches a browser.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn flowprobe() -> Command {
    let mut cmd = Command::cargo_bin("flowprobe").expect("flowprobe binary should exist");
    for var in [
        "LOGIN_USERNAME",
        "LOGIN_PASSWORD",
        "BASIC_AUTH_USERNAME",
        "BASIC_AUTH_PASSWORD",
        "FLOWPROBE_LOAN_BASE_URL",
        "FLOWPROBE_STORE_BASE_URL",
        "FP_VALID_CELL",
        "FP_VALID_ID",
        "CI",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    flowprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    flowprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_requires_subcommand() {
    flowprobe().assert().failure();
}

#[test]
fn test_run_help_lists_flags() {
    flowprobe()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--suite"))
        .stdout(predicate::str::contains("--retries"))
        .stdout(predicate::str::contains("--fail-fast"));
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_shows_every_suite() {
    flowprobe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("forgot-password"))
        .stdout(predicate::str::contains("TC_FP_003"))
        .stdout(predicate::str::contains("apply-happy-path"))
        .stdout(predicate::str::contains("TC013"));
}

#[test]
fn test_list_single_suite() {
    flowprobe()
        .args(["list", "--suite", "auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auth-valid-login"))
        .stdout(predicate::str::contains("4 scenarios"))
        .stdout(predicate::str::contains("TC001").not());
}

#[test]
fn test_list_json() {
    let output = flowprobe()
        .args(["list", "--json", "--suite", "register", "--filter", "TC00"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[0]["id"], "TC001");
    assert_eq!(rows[0]["site"], "store");
    assert_eq!(rows[0]["suite"], "register");
}

#[test]
fn test_list_unknown_suite_fails() {
    flowprobe()
        .args(["list", "--suite", "checkout"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown suite 'checkout'"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_masks_passwords() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flowprobe.yaml");
    fs::write(
        &path,
        "loan:\n  credentials:\n    username: jane\n    password: hunter2\nretries: 1\n",
    )
    .unwrap();

    flowprobe()
        .current_dir(dir.path())
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("jane"))
        .stdout(predicate::str::contains("hunter2").not())
        .stdout(predicate::str::contains("retries: 1"));
}

#[test]
fn test_config_show_secrets() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flowprobe.yaml");
    fs::write(&path, "loan:\n  credentials:\n    username: jane\n    password: hunter2\n").unwrap();

    flowprobe()
        .current_dir(dir.path())
        .args(["config", "--show-secrets", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn test_config_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flowprobe.yaml");
    fs::write(&path, "retries: [not, a, number]\n").unwrap();

    flowprobe()
        .current_dir(dir.path())
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(2);
}

// ============================================================================
// run (argument errors only)
// ============================================================================

#[test]
fn test_run_unknown_suite_fails_before_launch() {
    let dir = TempDir::new().unwrap();
    flowprobe()
        .current_dir(dir.path())
        .args(["run", "--suite", "checkout"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("forgot-password"));
}

#[test]
fn test_run_unknown_project_rejected_by_parser() {
    flowprobe()
        .args(["run", "--project", "iphone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pixel-5"));
}
