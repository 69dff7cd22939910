//! End-to-end tests of the `--headless` command line.

use super::common::queries_dir;
use std::process::{Command, Output};

fn run_binary(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_market-glance"))
        .arg("--config")
        .arg("/nonexistent/market-glance/config.toml")
        .arg("--queries-dir")
        .arg(queries_dir())
        .args(args)
        .env_remove("SNOWFLAKE_ACCOUNT")
        .env_remove("SNOWFLAKE_USER")
        .env_remove("SNOWFLAKE_PASSWORD")
        .output()
        .expect("Failed to run market-glance")
}

#[test]
fn test_headless_demo_run_succeeds() {
    let output = run_binary(&[
        "--headless",
        "--mock",
        "demo",
        "--events",
        "select:MSFT,assert:contains:Daily Close Price for MSFT",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Daily Close Price for MSFT"));
    assert!(stdout.contains("Assertions: 1 passed, 0 failed"));
}

#[test]
fn test_failed_assertion_sets_exit_code() {
    let output = run_binary(&[
        "--headless",
        "--mock",
        "empty",
        "--events",
        "assert:state:ticker_count>=1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No companies available to select."));
}

#[test]
fn test_json_output_reports_state() {
    let output = run_binary(&[
        "--headless",
        "--mock",
        "failing",
        "--output",
        "json",
        "--events",
        "key:tab",
    ]);

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["events_executed"], 1);
    assert_eq!(parsed["state"]["focus"], "ranked");
    assert_eq!(parsed["state"]["notices"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_output_file_receives_the_screen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("screen.txt");
    let output = run_binary(&[
        "--headless",
        "--mock",
        "demo",
        "--events",
        "key:f5",
        "--output-file",
        path.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Top 10 Sectors by Position (USD)"));
    assert!(written.contains("Events: 1 executed"));
}

#[test]
fn test_headless_without_events_is_rejected() {
    let output = run_binary(&["--headless", "--mock", "demo"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--headless requires --events or --script"));
}

#[test]
fn test_unknown_connection_name_is_reported_on_screen() {
    let output = run_binary(&["--headless", "--connection", "staging", "--events", "key:q"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("An error occurred while connecting to the warehouse"));
    assert!(stdout.contains("Connection 'staging' not found"));
}
