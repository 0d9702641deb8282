//! End-to-end tests for `dwell analyze`: output formats, filtering and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn dwell() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dwell"));
    cmd.env_remove("DWELL_LOG");
    cmd
}

fn sample_issues() -> Value {
    json!([
        {
            "key": "PROJ-1",
            "fields": {"summary": "Weekend hop", "created": "2024-01-05T16:00:00Z", "status": {"name": "Done"}},
            "changelog": {"histories": [{
                "created": "2024-01-08T10:00:00Z",
                "items": [{"field": "status", "fromString": "In Progress", "toString": "Done"}]
            }]}
        },
        {
            "key": "PROJ-2",
            "fields": {"created": "2024-01-01T09:00:00Z", "status": {"name": "Done"}},
            "changelog": {"histories": [
                {"created": "2024-01-05T09:00:00Z",
                 "items": [{"field": "status", "fromString": "To Do", "toString": "In Progress"}]},
                {"created": "2024-01-10T09:00:00Z",
                 "items": [{"field": "status", "fromString": "In Progress", "toString": "Done"}]}
            ]}
        }
    ])
}

/// Write `issues` into a fresh temp dir and return the dir and the file path
fn setup_input(issues: &Value) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("issues.json");
    fs::write(&path, serde_json::to_string_pretty(issues).unwrap()).unwrap();
    (temp_dir, path)
}

#[test]
fn test_analyze_writes_csv_to_stdout() {
    let (temp_dir, input) = setup_input(&sample_issues());

    dwell()
        .current_dir(temp_dir.path())
        .arg("analyze")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Issue Key,State,Start Time,End Time,Calendar Days\n",
        ))
        .stdout(predicate::str::contains(
            "PROJ-1,In Progress,2024-01-05T16:00:00+00:00,2024-01-08T10:00:00+00:00,2.75",
        ))
        .stdout(predicate::str::contains("PROJ-1,Done,2024-01-08T10:00:00+00:00,Current,"))
        .stderr(predicate::str::contains("Analyzed 2 issue(s), 0 failed"));
}

#[test]
fn test_business_hours_column() {
    let (temp_dir, input) = setup_input(&sample_issues());

    dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "--business-hours"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Issue Key,State,Start Time,End Time,Calendar Days,Business Hours\n",
        ))
        .stdout(predicate::str::contains(
            "PROJ-1,In Progress,2024-01-05T16:00:00+00:00,2024-01-08T10:00:00+00:00,2.75,2.00",
        ));
}

#[test]
fn test_quiet_suppresses_info() {
    let (temp_dir, input) = setup_input(&sample_issues());

    dwell()
        .current_dir(temp_dir.path())
        .args(["--quiet", "analyze"])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_output_file() {
    let (temp_dir, input) = setup_input(&sample_issues());
    let output = temp_dir.path().join("report.csv");

    dwell()
        .current_dir(temp_dir.path())
        .arg("analyze")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Results saved to"));

    let csv = fs::read_to_string(&output).unwrap();
    assert_eq!(csv.lines().count(), 1 + 2 + 3);
}

#[test]
fn test_date_range_filter() {
    let (temp_dir, input) = setup_input(&sample_issues());

    let output = dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "--from", "2024-01-06", "--to", "2024-01-31"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let proj2: Vec<_> = stdout.lines().filter(|l| l.starts_with("PROJ-2,")).collect();
    assert_eq!(proj2.len(), 1);
    assert!(proj2[0].starts_with("PROJ-2,Done,2024-01-10T09:00:00+00:00,Current,"));
}

#[test]
fn test_json_output() {
    let (temp_dir, input) = setup_input(&sample_issues());

    let output = dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "--json", "--business-hours", "--summary"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["metadata"]["command"], "analyze");
    assert_eq!(value["data"]["basis"], "business_hours");
    assert_eq!(value["data"]["results"][0]["issue_key"], "PROJ-1");
    assert_eq!(value["data"]["results"][0]["durations"][0]["business_hours"], 2.0);
    assert!(value["data"]["summary"].is_array());
}

#[test]
fn test_summary_table() {
    let (temp_dir, input) = setup_input(&sample_issues());

    dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "--summary"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("STATE"))
        .stdout(predicate::str::contains("In Progress"))
        .stdout(predicate::str::contains("Issue Key").not());
}

#[test]
fn test_failed_issue_does_not_fail_run() {
    let issues = json!([
        {"key": "BAD-1", "fields": {"status": {"name": "Open"}}},
        {"key": "OK-1", "fields": {"created": "2024-01-01T09:00:00Z", "status": {"name": "Open"}}}
    ]);
    let (temp_dir, input) = setup_input(&issues);

    dwell()
        .current_dir(temp_dir.path())
        .arg("analyze")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK-1,Open,"))
        .stdout(predicate::str::contains("BAD-1").not())
        .stderr(predicate::str::contains("Analyzed 2 issue(s), 1 failed"));
}

#[test]
fn test_config_file_window() {
    let (temp_dir, input) = setup_input(&sample_issues());
    fs::write(
        temp_dir.path().join("dwell.toml"),
        "[business_hours]\nstart_hour = 8\nend_hour = 18\n\n[analysis]\nbasis = \"business_hours\"\n",
    )
    .unwrap();

    // Friday 16:00-18:00 plus Monday 08:00-10:00
    dwell()
        .current_dir(temp_dir.path())
        .arg("analyze")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2.75,4.00"));
}

#[test]
fn test_exit_code_input_not_array() {
    let (temp_dir, input) = setup_input(&json!({"issues": []}));

    dwell()
        .current_dir(temp_dir.path())
        .arg("analyze")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("JSON array"))
        .stderr(predicate::str::contains("jq '.issues'"));
}

#[test]
fn test_exit_code_missing_input() {
    let temp_dir = TempDir::new().unwrap();

    dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "missing.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_exit_code_invalid_window() {
    let (temp_dir, input) = setup_input(&sample_issues());

    dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "--start-hour", "17", "--end-hour", "9"])
        .arg(&input)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("must be before end"));
}

#[test]
fn test_exit_code_invalid_date() {
    let (temp_dir, input) = setup_input(&sample_issues());

    dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "--from", "last tuesday"])
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid date for --from"));
}

#[test]
fn test_json_error_envelope() {
    let temp_dir = TempDir::new().unwrap();

    let output = dwell()
        .current_dir(temp_dir.path())
        .args(["analyze", "missing.json", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "NOT_FOUND");
    assert!(!value["error"]["suggestions"].as_array().unwrap().is_empty());
}

#[test]
fn test_exit_code_missing_explicit_config() {
    let (temp_dir, input) = setup_input(&sample_issues());

    dwell()
        .current_dir(temp_dir.path())
        .args(["--config", "does-not-exist.toml", "analyze"])
        .arg(&input)
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_misspelled_config_key_fails() {
    let (temp_dir, input) = setup_input(&sample_issues());
    fs::write(
        temp_dir.path().join("dwell.toml"),
        "[business_hours]\nstart = 7\nend = 19\n",
    )
    .unwrap();

    dwell()
        .current_dir(temp_dir.path())
        .arg("analyze")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to parse"))
        .stderr(predicate::str::contains("unknown field"));
}

/// Many open issues, enough CSV to overflow a pipe buffer
fn large_batch() -> Value {
    let issues: Vec<Value> = (0..5_000)
        .map(|i| {
            json!({
                "key": format!("BULK-{}", i),
                "fields": {"created": "2024-01-01T09:00:00Z", "status": {"name": "Open"}}
            })
        })
        .collect();
    Value::Array(issues)
}

/// Run `dwell` with stdout closed by the reader before any output is read
fn run_with_closed_stdout(args: &[&str], input: &std::path::Path) -> std::process::Output {
    use std::process::Stdio;

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin!("dwell"))
        .args(args)
        .arg(input)
        .env_remove("DWELL_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    drop(child.stdout.take());
    child.wait_with_output().unwrap()
}

#[test]
fn test_closed_stdout_exits_cleanly_for_csv() {
    let (_temp_dir, input) = setup_input(&large_batch());

    let output = run_with_closed_stdout(&["--quiet", "analyze"], &input);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr);
    assert!(!stderr.contains("Error"), "stderr: {}", stderr);
}

#[test]
fn test_closed_stdout_exits_cleanly_for_json() {
    let (_temp_dir, input) = setup_input(&large_batch());

    let output = run_with_closed_stdout(&["--quiet", "analyze", "--json"], &input);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr);
    assert!(!stderr.contains("panicked"), "stderr: {}", stderr);
}
