//! Integration tests for logging and process exit behaviour of the dkr binary.
//!
//! Runs the real binary against an engine address that refuses connections, with the
//! dkr home relocated into a temp directory.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const UNREACHABLE_ENGINE: &str = "tcp://127.0.0.1:1";

fn run_dkr(home: &TempDir, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_dkr");
    Command::new(bin)
        .env("DKR_HOME", home.path())
        .env_remove("DKR_LOG")
        .env_remove("DKR_LOG_OUTPUT")
        .env_remove("DKR_LOG_FORMAT")
        .arg("--host")
        .arg(UNREACHABLE_ENGINE)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_default_logging_is_silent() {
    let home = TempDir::new().unwrap();
    let output = run_dkr(&home, &[]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.trim(),
        "No valid command specified. `dkr -h` for help."
    );
    assert!(!home.path().join("dkr.log").exists());
}

#[test]
fn test_file_logging_writes_under_dkr_home() {
    let home = TempDir::new().unwrap();
    let output = run_dkr(&home, &["--log-level", "info", "--log-output", "file"]);

    assert!(
        output.status.success(),
        "dkr should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let log_file = home.path().join("dkr.log");
    let contents = fs::read_to_string(&log_file).unwrap();
    assert!(
        contents.contains("Dkr CLI starting"),
        "log file should contain startup line, got: {}",
        contents
    );
}

#[test]
fn test_unreachable_engine_exits_with_engine_code() {
    let home = TempDir::new().unwrap();
    let output = run_dkr(&home, &["image", "list"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!output.stderr.is_empty());
    // State is still written for the next invocation.
    assert!(home.path().join("state.json").exists());
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    let output = run_dkr(&home, &["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("dkr "));
}
