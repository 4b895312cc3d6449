//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home
//! directory, so the config file and database start empty.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli_with_input(home: &TempDir, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_examroom"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("EXAMROOM_ENV")
        .env_remove("EXAMROOM_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(home, args, "")
}

fn run_cli_success(home: &TempDir, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

fn add_exam(home: &TempDir, subject: &str) -> String {
    let out = run_cli_success(
        home,
        &[
            "exam", "add", "--subject", subject, "--date", "2030-06-15", "--time", "09:00",
            "--material", "Chapter 1", "--material", "Chapter 2", "--material", "Chapter 3",
            "--questions", "Essay",
        ],
    );
    out.trim()
        .strip_prefix("Exam added: ")
        .expect("add prints the new id")
        .to_string()
}

#[test]
fn test_exam_add_and_list() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "Chemistry");

    let list = run_cli_success(&home, &["exam", "list"]);
    assert!(list.contains(&id));
    assert!(list.contains("Chemistry"));
    assert!(list.contains("9:00 AM"));
    assert!(list.contains("0/3 done (0%)"));
}

#[test]
fn test_exam_add_rejects_blank_subject() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(
        &home,
        &[
            "exam", "add", "--subject", " ", "--date", "2030-06-15", "--time", "09:00",
            "--material", "Notes", "--questions", "Essay",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_material_toggle() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "Biology");

    let out = run_cli_success(&home, &["exam", "material", "toggle", &id, "1"]);
    assert!(out.contains(" 1. [x] Chapter 1"));
    assert!(out.contains("1/3 done (33%)"));

    let (_, _, code) = run_cli(&home, &["exam", "material", "toggle", &id, "7"]);
    assert_eq!(code, 1);
}

#[test]
fn test_timer_start_and_status() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "Physics");

    let out = run_cli_success(&home, &["timer", "start", &id]);
    assert!(out.contains("stopwatch_started"));

    let out = run_cli_success(&home, &["timer", "start", &id]);
    assert!(out.contains("nothing to do"));

    let out = run_cli_success(&home, &["timer", "status", &id]);
    let status: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(status["running"], true);
    assert_eq!(status["mode"], "stopwatch");
}

#[test]
fn test_pomodoro_mode_status() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "History");

    run_cli_success(&home, &["timer", "mode", &id, "pomodoro"]);
    let out = run_cli_success(&home, &["timer", "status", &id]);
    let status: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(status["phase"]["phase"], "idle");
    assert_eq!(status["phase"]["remainingSecs"], 1500);
}

#[test]
fn test_delete_prompts_on_stdin() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "Latin");

    let (stdout, stderr, code) = run_cli_with_input(&home, &["exam", "delete", &id], "n\n");
    assert_eq!(code, 0);
    assert!(stderr.contains("[y/N]"));
    assert!(stdout.contains("cancelled"));

    let (stdout, _, code) = run_cli_with_input(&home, &["exam", "delete", &id], "y\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("exam_deleted"));

    let list = run_cli_success(&home, &["exam", "list"]);
    assert!(list.contains("No exams yet."));
}

#[test]
fn test_yes_flag_skips_prompt() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "Maths");
    let out = run_cli_success(&home, &["--yes", "timer", "reset", &id]);
    assert!(out.contains("study_time_reset"));
}

#[test]
fn test_unknown_exam_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["timer", "start", "12345"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("No exam with id 12345"));
}

#[test]
fn test_history_json() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "Art");
    let out = run_cli_success(&home, &["history", &id]);
    let history: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(history["totalStudySeconds"], 0);
    assert!(history["sessions"].as_array().unwrap().is_empty());
}

#[test]
fn test_prefs_persist() {
    let home = TempDir::new().unwrap();
    run_cli_success(&home, &["prefs", "mute"]);
    run_cli_success(&home, &["prefs", "style", "soft"]);
    let out = run_cli_success(&home, &["prefs", "show"]);
    let prefs: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(prefs["muted"], true);
    assert_eq!(prefs["style"], "soft");
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(&home, &["config", "get", "pomodoro.focus_duration"]);
    assert_eq!(out.trim(), "25");

    run_cli_success(&home, &["config", "set", "pomodoro.focus_duration", "50"]);
    let out = run_cli_success(&home, &["config", "get", "pomodoro.focus_duration"]);
    assert_eq!(out.trim(), "50");

    let (_, _, code) = run_cli(&home, &["config", "set", "pomodoro.nope", "1"]);
    assert_eq!(code, 1);
}

#[test]
fn test_watch_runs_fixed_ticks() {
    let home = TempDir::new().unwrap();
    add_exam(&home, "Music");
    run_cli_success(&home, &["config", "set", "scheduler.tick_interval_ms", "50"]);

    let out = run_cli_success(&home, &["watch", "--ticks", "2"]);
    assert!(out.contains("tick 0"));
    assert!(out.contains("tick 1"));
    assert!(out.contains("Music"));
}

#[test]
fn test_history_separates_recorded_and_live_time() {
    let home = TempDir::new().unwrap();
    let id = add_exam(&home, "Drama");
    run_cli_success(&home, &["timer", "start", &id]);
    std::thread::sleep(std::time::Duration::from_millis(1100));

    let out = run_cli_success(&home, &["history", &id]);
    let history: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(history["totalStudySeconds"], 0);
    assert!(history["elapsedSeconds"].as_u64().unwrap() >= 1);
}
