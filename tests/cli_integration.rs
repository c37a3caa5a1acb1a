//! CLI integration tests.
//!
//! These tests invoke the sway binary and verify command output and behaviour.

#![allow(deprecated)] // cargo_bin is deprecated but still works

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

/// Address nothing listens on, so every request fails immediately.
const DEAD_API_BASE: &str = "http://127.0.0.1:1";

/// Proxy settings that would reroute requests to the local test server.
const PROXY_VARS: [&str; 6] = [
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
];

/// Helper to get a Command for the sway binary with an isolated environment.
fn sway(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sway").unwrap();
    cmd.env("SWAY_CONFIG_DIR", config_dir.path())
        .env("GEMINI_API_KEY", "test-key")
        .env_remove("GEMINI_MODEL")
        .env_remove("SWAY_LOG");
    for var in PROXY_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a config dir with the given commands and settings.
fn setup(commands: &[(&str, &str)], api_base: &str, interval_secs: u64) -> TempDir {
    let temp = TempDir::new().unwrap();
    let commands_dir = temp.path().join("commands");
    fs::create_dir_all(&commands_dir).unwrap();

    for (name, contents) in commands {
        let path = commands_dir.join(format!("{name}.toml"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    let settings = format!(
        r#"
model = "test-model"
api_base = "{api_base}"
timeout_secs = 5

[retry]
max_attempts = 1

[maintenance]
interval_secs = {interval_secs}
"#
    );
    fs::write(temp.path().join("sway.toml"), settings).unwrap();

    temp
}

/// Helper to create the four maintenance commands.
fn maintenance_commands() -> Vec<(&'static str, &'static str)> {
    vec![
        ("healthcheck", "prompt = \"Check health\""),
        ("git/autosync", "prompt = \"Sync git\""),
        ("deploy", "prompt = \"Check deployment\""),
        ("optimize", "prompt = \"Optimize\""),
    ]
}

/// Serve one HTTP request with a canned JSON body; yields the raw request.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        // Read headers, then exactly Content-Length bytes of body.
        let header_end = loop {
            let n = stream.read(&mut buf).unwrap();
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = find(&request, b"\r\n\r\n") {
                break pos + 4;
            }
            assert!(n > 0, "connection closed before headers");
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length: usize = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut buf).unwrap();
            assert!(n > 0, "connection closed before body");
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&request).to_string()
    });

    (base, handle)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ============================================================================
// Basic CLI tests
// ============================================================================

#[test]
fn test_no_args_shows_usage() {
    let temp = setup(&[("develop", "prompt = \"{{args}}\"")], DEAD_API_BASE, 300);

    sway(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: sway <command> [args]"))
        .stdout(predicate::str::contains("Commands: develop, maintain"));
}

#[test]
fn test_help_flag() {
    let temp = TempDir::new().unwrap();
    sway(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--list"));
}

#[test]
fn test_version_flag() {
    let temp = TempDir::new().unwrap();
    sway(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sway"));
}

#[test]
fn test_list_flag() {
    let temp = setup(
        &[(
            "document",
            "description = \"Write docs\"\nprompt = \"Document {{args}}\"",
        )],
        DEAD_API_BASE,
        300,
    );

    sway(&temp)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("document"))
        .stdout(predicate::str::contains("Write docs"))
        .stdout(predicate::str::contains("maintain"));
}

#[test]
fn test_completions_bash() {
    let temp = TempDir::new().unwrap();
    sway(&temp)
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sway"));
}

// ============================================================================
// Dispatch tests
// ============================================================================

#[test]
fn test_dispatch_sends_rendered_prompt() {
    let (base, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi, world!"}]},"finishReason":"STOP"}]}"#,
    );
    let temp = setup(&[("greet", "prompt = \"Say hi to {{args}}\"")], &base, 300);

    sway(&temp)
        .args(["greet", "world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Executing: greet"))
        .stdout(predicate::str::contains("Task: world"))
        .stdout(predicate::str::contains("Hi, world!"));

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /models/test-model:generateContent"));
    assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
    assert!(request.contains(r#""text":"Say hi to world""#));
}

#[test]
fn test_dispatch_joins_args_with_spaces() {
    let (base, server) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#,
    );
    let temp = setup(&[("debug", "prompt = \"Debug: {{args}}\"")], &base, 300);

    sway(&temp)
        .args(["debug", "the", "login", "flow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task: the login flow"));

    let request = server.join().unwrap();
    assert!(request.contains(r#""text":"Debug: the login flow""#));
}

#[test]
fn test_unknown_command_reports_not_found() {
    let temp = setup(&[], DEAD_API_BASE, 300);

    sway(&temp)
        .arg("unknown-command")
        .assert()
        .success()
        .stdout(predicate::str::contains("Command 'unknown-command' not found"))
        .stdout(predicate::str::contains("Executing").not());
}

#[test]
fn test_invalid_command_file_reported_distinctly() {
    let temp = setup(&[("broken", "prompt = \"unterminated")], DEAD_API_BASE, 300);

    sway(&temp)
        .arg("broken")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Command 'broken' has an invalid configuration",
        ))
        .stdout(predicate::str::contains("not found").not());
}

#[test]
fn test_remote_failure_is_reported_not_fatal() {
    let temp = setup(&[("deploy", "prompt = \"Deploy {{args}}\"")], DEAD_API_BASE, 300);

    sway(&temp)
        .args(["deploy", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Executing: deploy"))
        .stdout(predicate::str::contains("Error:"));
}

#[test]
fn test_api_error_message_is_shown() {
    let (base, server) = serve_once(
        "HTTP/1.1 400 Bad Request",
        r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
    );
    let temp = setup(&[("secure", "prompt = \"Audit\"")], &base, 300);

    sway(&temp)
        .arg("secure")
        .assert()
        .success()
        .stdout(predicate::str::contains("API error (400): API key not valid."));

    server.join().unwrap();
}

#[test]
fn test_not_found_without_api_key() {
    let temp = setup(&[], DEAD_API_BASE, 300);

    sway(&temp)
        .env_remove("GEMINI_API_KEY")
        .arg("unknown-command")
        .assert()
        .success()
        .stdout(predicate::str::contains("Command 'unknown-command' not found"));
}

#[test]
fn test_missing_api_key_reported_per_dispatch() {
    let temp = setup(&[("greet", "prompt = \"hi\"")], DEAD_API_BASE, 300);

    sway(&temp)
        .env_remove("GEMINI_API_KEY")
        .arg("greet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Executing: greet"))
        .stdout(predicate::str::contains("Error: No API key configured"));
}

#[test]
fn test_malformed_settings_fail_at_startup() {
    let temp = setup(&[], DEAD_API_BASE, 300);
    fs::write(temp.path().join("sway.toml"), "timeout_secs = \"soon\"").unwrap();

    let output = sway(&temp)
        .arg("greet")
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).unwrap();

    assert_eq!(stderr.matches("Failed to parse settings TOML").count(), 1);
    assert!(stderr.starts_with("Error: "));
    assert!(!stderr.contains('\x1b'));
}

// ============================================================================
// Maintenance loop tests
// ============================================================================

#[test]
fn test_maintain_with_failing_service_reports_each_step() {
    let temp = setup(&maintenance_commands(), DEAD_API_BASE, 0);

    let output = sway(&temp)
        .args(["--cycles", "2", "maintain"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    assert!(stdout.contains("Starting autonomous maintenance loop..."));
    assert_eq!(stdout.matches("Running health check...").count(), 2);
    assert_eq!(stdout.matches("Syncing with git...").count(), 2);
    assert_eq!(stdout.matches("Checking deployment...").count(), 2);
    assert_eq!(stdout.matches("Running optimization...").count(), 2);
    assert_eq!(stdout.matches("Error:").count(), 8);
}

#[test]
fn test_maintain_missing_commands_keep_running() {
    let temp = setup(&[], DEAD_API_BASE, 0);

    sway(&temp)
        .args(["--cycles", "1", "maintain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Command 'healthcheck' not found"))
        .stdout(predicate::str::contains("Command 'optimize' not found"));
}

#[test]
fn test_maintain_without_api_key_keeps_running() {
    let temp = setup(&maintenance_commands(), DEAD_API_BASE, 0);

    let output = sway(&temp)
        .env_remove("GEMINI_API_KEY")
        .args(["--cycles", "1", "maintain"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    assert_eq!(stdout.matches("Error: No API key configured").count(), 4);
}

#[cfg(unix)]
#[test]
fn test_maintain_stops_cleanly_on_interrupt() {
    use std::process::{Command as StdCommand, Stdio};
    use std::time::Duration;

    let temp = setup(&maintenance_commands(), DEAD_API_BASE, 1);

    let mut cmd = StdCommand::new(assert_cmd::cargo::cargo_bin("sway"));
    for var in PROXY_VARS {
        cmd.env_remove(var);
    }
    let child = cmd
        .arg("maintain")
        .env("SWAY_CONFIG_DIR", temp.path())
        .env("GEMINI_API_KEY", "test-key")
        .env_remove("GEMINI_MODEL")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(1500));
    let status = StdCommand::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Autonomous loop stopped by user"));
    assert!(stdout.matches("Error:").count() >= 4);
}
