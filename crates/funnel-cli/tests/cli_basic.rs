//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! gets its own HOME so config writes never collide.

use std::path::PathBuf;
use std::process::Command;

fn test_home(name: &str) -> PathBuf {
    let home = std::env::temp_dir().join(format!("funnel-cli-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&home).expect("Failed to create test HOME");
    home
}

/// Run a CLI command and return output.
fn run_cli(home: &str, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "funnel-cli", "--"])
        .args(args)
        .env("HOME", test_home(home))
        .env_remove("FUNNEL_ENV")
        .env_remove("API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn parse_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("event line is not JSON"))
        .collect()
}

#[test]
fn test_simulate_emits_json_events() {
    let (stdout, _, code) = run_cli("simulate", &["simulate", "--seconds", "50", "--seed", "7"]);
    assert_eq!(code, 0, "simulate failed");

    let events = parse_lines(&stdout);
    assert_eq!(events[0]["type"], "SessionStarted");
    assert_eq!(events.last().unwrap()["type"], "SessionEnded");

    let unlocked: Vec<_> = events
        .iter()
        .filter(|e| e["type"] == "GateUnlocked")
        .collect();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0]["cause"], "fallback");
    assert_eq!(unlocked[0]["at_ms"], 45_000);
}

#[test]
fn test_simulate_progress_unlocks_early() {
    let (stdout, _, code) = run_cli(
        "progress",
        &["simulate", "--seconds", "20", "--seed", "7", "--progress-step", "2"],
    );
    assert_eq!(code, 0, "simulate failed");

    let events = parse_lines(&stdout);
    let unlocked = events
        .iter()
        .find(|e| e["type"] == "GateUnlocked")
        .expect("gate never unlocked");
    assert_eq!(unlocked["cause"], "progress");
    assert_eq!(unlocked["at_ms"], 15_000);
}

#[test]
fn test_simulate_summary() {
    let (stdout, _, code) = run_cli(
        "summary",
        &["simulate", "--seconds", "10", "--seed", "1", "--summary"],
    );
    assert_eq!(code, 0, "simulate --summary failed");

    let snapshot: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snapshot["remaining_secs"], 590);
    assert_eq!(snapshot["timer_display"], "9:50");
    assert_eq!(snapshot["spots_left"], 9);
    assert_eq!(snapshot["unlocked"], false);
}

#[test]
fn test_simulate_same_seed_same_output() {
    let args = ["simulate", "--seconds", "120", "--seed", "42", "--progress-step", "1"];
    let (first, _, _) = run_cli("seed-a", &args);
    let (second, _, _) = run_cli("seed-b", &args);

    let strip = |stdout: &str| -> Vec<serde_json::Value> {
        parse_lines(stdout)
            .into_iter()
            .filter(|e| e["type"] != "SessionStarted")
            .collect()
    };
    assert_eq!(strip(&first), strip(&second));
}

#[test]
fn test_config_get_default() {
    let (stdout, _, code) = run_cli("get", &["config", "get", "scarcity.initial_spots"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "10");
}

#[test]
fn test_config_set_then_get() {
    let (stdout, _, code) = run_cli("set", &["config", "set", "ai.model", "gemini-2.0-flash"]);
    assert_eq!(code, 0, "config set failed");
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli("set", &["config", "get", "ai.model"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "gemini-2.0-flash");
}

#[test]
fn test_config_set_rejects_invalid_value() {
    let (_, stderr, code) = run_cli("invalid", &["config", "set", "gate.unlock_threshold_secs", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (stdout, _, _) = run_cli("invalid", &["config", "get", "gate.unlock_threshold_secs"]);
    assert_eq!(stdout.trim(), "30.0");
}

#[test]
fn test_config_unknown_key() {
    let (_, stderr, code) = run_cli("unknown", &["config", "get", "gate.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_path_and_list() {
    let (stdout, _, code) = run_cli("list", &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));

    let (stdout, _, code) = run_cli("list", &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[gate]"));
    assert!(stdout.contains("[[toast.catalog]]"));
}

#[test]
fn test_ask_without_api_key_fails() {
    let (_, stderr, code) = run_cli("ask", &["ask", "analyze", "você está exagerando"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("API key"));
}
