//! End-to-end tests for the `fence` binary.
//!
//! Only `replay` runs here; `watch` needs the `bpf` feature and root.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const EVENTS: &str = r#"{"pid":1234,"uid":1000,"comm":"cat","path":"/etc/passwd"}
{"pid":1234,"uid":1000,"comm":"cat","path":"/home/safe.txt"}
{"pid":1234,"uid":1000,"comm":"cat","path":"/etc/shadow"}
{"pid":4321,"uid":1000,"comm":"less","path":"/home/u/.ssh/id_rsa"}
"#;

fn run_fence(args: &[&str]) -> Output {
    let binary = env!("CARGO_BIN_EXE_fence");
    Command::new(binary)
        .args(args)
        .output()
        .expect("Failed to execute fence")
}

fn write_events(dir: &TempDir) -> String {
    let path = dir.path().join("events.jsonl");
    fs::write(&path, EVENTS).expect("write events");
    path.to_str().expect("utf8 path").to_string()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

#[test]
fn test_replay_reports_blocked_pid() {
    let dir = TempDir::new().expect("tempdir");
    let events = write_events(&dir);

    let output = run_fence(&["replay", "--events", &events, "--disallowed", "/etc/*, .ssh"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(stderr.contains("Disallowed files: [\"/etc/*\", \".ssh\"]"));
    assert!(stderr.contains("[VIOLATION 1/2] PID 1234 (cat) opened disallowed file: /etc/passwd"));
    assert!(stderr.contains("*** PID 1234 is now BLOCKED from opening any further files! ***"));
    assert!(stderr.contains("Exiting..."));
    assert!(stderr.contains("Total violations: 3 from 2 process(es)"));
    assert!(stderr.contains("Blocked PIDs: [1234]"));
}

#[test]
fn test_replay_with_patterns_file_and_journal() {
    let dir = TempDir::new().expect("tempdir");
    let events = write_events(&dir);
    let patterns = dir.path().join("patterns.txt");
    fs::write(&patterns, "# keys\n.ssh\n").expect("write patterns");
    let journal = dir.path().join("out").join("journal.jsonl");

    let output = run_fence(&[
        "replay",
        "--events",
        &events,
        "--patterns-file",
        path_str(&patterns),
        "--threshold",
        "1",
        "--journal",
        path_str(&journal),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let content = fs::read_to_string(&journal).expect("journal");
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "violation");
    assert_eq!(lines[0]["pid"], 4321);
    assert_eq!(lines[1]["kind"], "blocked");
    assert!(lines.iter().all(|l| l["ts"].is_string()));
}

#[test]
fn test_zero_threshold_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let events = write_events(&dir);

    let output = run_fence(&["replay", "--events", &events, "-d", "/etc/*", "-t", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("threshold must be at least 1"));
}

#[test]
fn test_missing_patterns_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let events = write_events(&dir);

    let output = run_fence(&["replay", "--events", &events]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_bad_events_file() {
    let dir = TempDir::new().expect("tempdir");
    let events = dir.path().join("events.jsonl");
    fs::write(&events, "{\"pid\":1,\"uid\":0,\"comm\":\"x\",\"path\":\"/a\"}\nnope\n").expect("write");

    let output = run_fence(&["replay", "--events", path_str(&events), "-d", "/a"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 2"));
}

#[test]
fn test_missing_events_file() {
    let output = run_fence(&["replay", "--events", "/nonexistent/fence/events.jsonl", "-d", "/a"]);
    assert_eq!(output.status.code(), Some(3));
}
