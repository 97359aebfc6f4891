//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home directory,
//! so config and timer snapshot never leak between tests.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_seance"))
        .args(args)
        .env("HOME", home)
        .env_remove("SEANCE_ENV")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["--help"]);
    assert_eq!(code, 0);
    for cmd in ["start", "pause", "resume", "confirm", "stop", "status", "run", "login", "task"] {
        assert!(stdout.contains(cmd), "help is missing {cmd}");
    }
}

#[test]
fn test_config_defaults_and_set() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "session.study_min"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "session.study_min", "50"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "session.study_min"]);
    assert_eq!(stdout.trim(), "50");

    assert!(home.path().join(".config/seance/config.toml").exists());
}

#[test]
fn test_config_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "session.bogus", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_status_when_idle() {
    let home = tempfile::tempdir().unwrap();
    let status = run_json(home.path(), &["status"]);
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["phase"], "idle");
}

#[test]
fn test_pause_when_idle_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["pause"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot pause while idle"), "stderr: {stderr}");
}

#[test]
fn test_offline_session_lifecycle() {
    let home = tempfile::tempdir().unwrap();
    let started = run_json(home.path(), &["start", "--offline", "--name", "Maths"]);
    assert_eq!(started["type"], "session_started");
    assert_eq!(started["study_duration_sec"], 1500);
    assert!(started["session_id"].as_str().unwrap().starts_with("local-"));

    let status = run_json(home.path(), &["status"]);
    assert_eq!(status["phase"], "study");
    assert_eq!(status["time_left_sec"], 1500);

    let paused = run_json(home.path(), &["pause"]);
    assert_eq!(paused["type"], "paused");
    let (_, _, code) = run_cli(home.path(), &["pause"]);
    assert_eq!(code, 1, "second pause must be rejected");

    let (_, _, code) = run_cli(home.path(), &["start", "--offline"]);
    assert_eq!(code, 1, "only one session at a time");

    let summary = run_json(home.path(), &["stop"]);
    assert_eq!(summary["interruptions"], 1);
    assert_eq!(summary["statut"], "terminee");

    let status = run_json(home.path(), &["status"]);
    assert_eq!(status["phase"], "idle");
}

#[test]
fn test_start_rejects_invalid_durations() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["start", "--offline", "--total-min", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    let status = run_json(home.path(), &["status"]);
    assert_eq!(status["phase"], "idle");
}

#[cfg(unix)]
#[test]
fn test_run_detaches_on_interrupt() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let home = tempfile::tempdir().unwrap();
    run_json(home.path(), &["start", "--offline"]);

    // stdin stays open so the read is still pending when the signal lands.
    let mut child = Command::new(env!("CARGO_BIN_EXE_seance"))
        .arg("run")
        .env("HOME", home.path())
        .env_remove("SEANCE_ENV")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn run");
    std::thread::sleep(Duration::from_millis(1500));

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("run did not exit after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(exit.success());

    let status = run_json(home.path(), &["status"]);
    assert_eq!(status["phase"], "study");
}
