#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the identity-gateway-server binary.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tempfile::TempDir;
use tokio::time::timeout;

const HTTP_CONFIG: &str = r#"
server:
  bind_addr: "127.0.0.1:0"
gateway:
  transport: http
  http:
    base_url: "http://127.0.0.1:9"
    tls:
      mode: insecure
"#;

fn command(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_identity-gateway-server"));
    cmd.args(args)
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn run_server(args: &[&str]) -> std::process::Output {
    command(args)
        .output()
        .expect("Failed to execute identity-gateway-server")
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, contents).expect("Failed to write config");
    path
}

#[derive(Deserialize)]
struct Printed {
    server: PrintedServer,
    gateway: PrintedGateway,
}

#[derive(Deserialize)]
struct PrintedServer {
    bind_addr: String,
}

#[derive(Deserialize)]
struct PrintedGateway {
    transport: String,
}

fn parse_printed(stdout: &str) -> Printed {
    let yaml = stdout
        .strip_prefix("Effective configuration:\n")
        .expect("print-config output should start with a header");
    serde_saphyr::from_str(yaml).expect("print-config output should be valid YAML")
}

#[test]
fn test_cli_help_command() {
    let output = run_server(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("identity-gateway-server"));
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--print-config"));
}

#[test]
fn test_cli_version_command() {
    let output = run_server(&["--version"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("identity-gateway-server"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_missing_config_file() {
    let output = run_server(&["--config", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "{stderr}");
}

#[test]
fn test_cli_rejects_unknown_config_keys() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "gateway:\n  resilence:\n    max_attempts: 2\n");

    let output = run_server(&["--config", path.to_str().unwrap(), "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("resilence"), "{stderr}");
}

#[test]
fn test_print_config_applies_port_override() {
    let output = run_server(&["--print-config", "--port", "9999"]);
    assert!(output.status.success());

    let printed = parse_printed(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(printed.server.bind_addr, "0.0.0.0:9999");
    assert_eq!(printed.gateway.transport, "invoke");
}

#[test]
fn test_print_config_reads_environment() {
    let output = command(&["--print-config"])
        .env("IDGW__GATEWAY__TRANSPORT", "http")
        .env("IDGW__SERVER__BIND_ADDR", "127.0.0.1:7000")
        .output()
        .unwrap();
    assert!(output.status.success());

    let printed = parse_printed(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(printed.gateway.transport, "http");
    assert_eq!(printed.server.bind_addr, "127.0.0.1:7000");
}

#[test]
fn test_check_accepts_http_transport() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, HTTP_CONFIG);

    let output = run_server(&["--config", path.to_str().unwrap(), "check"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "check failed: {stderr}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"));
    assert!(stdout.contains("transport: http"));
}

#[test]
fn test_check_reports_invalid_policy() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &format!("{HTTP_CONFIG}  resilience:\n    max_attempts: 0\n"),
    );

    let output = run_server(&["--config", path.to_str().unwrap(), "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gateway.resilience.max_attempts"), "{stderr}");
}

#[tokio::test]
async fn test_run_keeps_serving_until_stopped() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, HTTP_CONFIG);

    let child = tokio::process::Command::new(env!("CARGO_BIN_EXE_identity-gateway-server"))
        .args(["--config", path.to_str().unwrap(), "run"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    let result = timeout(Duration::from_secs(2), child.wait_with_output()).await;
    assert!(result.is_err(), "server exited before being stopped");
}
