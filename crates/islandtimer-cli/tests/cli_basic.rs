//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_islandtimer"))
        .args(args)
        .env("ISLANDTIMER_DATA_DIR", data_dir)
        .env("ISLANDTIMER_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn events(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

#[test]
fn test_timer_status_when_idle() {
    let dir = tempfile::tempdir().unwrap();
    let status: Value = serde_json::from_str(&run_ok(dir.path(), &["timer", "status"])).unwrap();
    assert_eq!(status["active"], false);
}

#[test]
fn test_timer_run_custom_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "timer.tick_interval_ms", "100"]);

    let stdout = run_ok(dir.path(), &["timer", "run", "--custom", "0.5", "--label", "Tea"]);
    let events = events(&stdout);
    assert_eq!(events.first().unwrap()["type"], "TimerStarted");
    assert_eq!(events.first().unwrap()["label"], "Tea");
    assert_eq!(events.last().unwrap()["type"], "TimerCompleted");

    let status: Value = serde_json::from_str(&run_ok(dir.path(), &["timer", "status"])).unwrap();
    assert_eq!(status["active"], false);
}

#[test]
fn test_timer_run_unknown_preset_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "run", "Lasagna"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown preset"));
}

#[test]
fn test_timer_recover_with_nothing_stored() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(dir.path(), &["timer", "recover"]);
    assert!(stdout.contains("no timer to recover"));
}

#[test]
fn test_timer_clear() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(dir.path(), &["timer", "clear"]);
    assert!(stdout.contains("cleared"));
}

#[test]
fn test_preset_add_list_remove() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["preset", "add", "Tea", "--secs", "240", "--color", "teal"]);

    let list: Value =
        serde_json::from_str(&run_ok(dir.path(), &["preset", "list", "--json"])).unwrap();
    assert_eq!(list["builtin"].as_array().unwrap().len(), 3);
    let custom = list["custom"].as_array().unwrap();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0]["name"], "Tea");
    assert_eq!(custom[0]["duration_ms"], 240_000);
    assert_eq!(custom[0]["color"], "teal");

    let stdout = run_ok(dir.path(), &["preset", "remove", "0"]);
    assert!(stdout.contains("Tea"));
    let (_, _, code) = run_cli(dir.path(), &["preset", "remove", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_preset_add_rejects_zero_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["preset", "add", "Nothing", "--secs", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "timer.tick_interval_ms"]).trim(), "1000");

    run_ok(dir.path(), &["config", "set", "widget.idle_refresh_secs", "120"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "widget.idle_refresh_secs"]).trim(), "120");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "widget.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_widget_timeline_idle() {
    let dir = tempfile::tempdir().unwrap();
    let timeline: Value =
        serde_json::from_str(&run_ok(dir.path(), &["widget", "timeline"])).unwrap();
    let entries = timeline["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["label"], "Timer");
    assert_eq!(entries[0]["running"], false);
}

#[test]
fn test_stopwatch_run_for() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(dir.path(), &["stopwatch", "run", "--for", "0.05"]);
    assert_eq!(stdout.trim(), "00:00.05");
}

#[test]
fn test_ambient_watch_disabled() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "ambient.enabled", "false"]);
    let output = Command::new(env!("CARGO_BIN_EXE_islandtimer"))
        .args(["ambient", "watch", "--count", "1"])
        .env("ISLANDTIMER_DATA_DIR", dir.path())
        .env("ISLANDTIMER_LOG", "islandtimer=warn")
        .output()
        .expect("Failed to execute CLI command");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("disabled"));
}

#[test]
fn test_ambient_watch_without_timer() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(dir.path(), &["ambient", "watch", "--count", "1"]);
    assert!(stdout.is_empty());
}
