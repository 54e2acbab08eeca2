//! Integration tests for the `logicircle` CLI binary.
//!
//! Argument parsing, help output, completions, config handling, and the
//! cloud-bound commands against a wiremock camera cloud.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `logicircle` binary with env isolation.
///
/// Clears all `LOGICIRCLE_*` env vars and points the config file into
/// `dir` so tests never touch the user's real configuration.
fn logicircle_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("logicircle");
    cmd.env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("LOGICIRCLE_CONFIG", dir.join("config.toml"))
        .env_remove("LOGICIRCLE_USERNAME")
        .env_remove("LOGICIRCLE_PASSWORD")
        .env_remove("LOGICIRCLE_API_URL")
        .env_remove("LOGICIRCLE_FORMAT")
        .env_remove("LOGICIRCLE_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Command wired to a mock cloud with credentials in the environment.
fn cloud_cmd(dir: &Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = logicircle_cmd(dir);
    cmd.env("LOGICIRCLE_USERNAME", "a@x.com")
        .env("LOGICIRCLE_PASSWORD", "hunter2")
        .env("LOGICIRCLE_API_URL", server.uri());
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_cloud(login_status: u16) -> MockServer {
    let server = MockServer::start().await;
    let node = server.address().to_string();

    Mock::given(method("POST"))
        .and(path("/api/accounts/authorization"))
        .respond_with(
            ResponseTemplate::new(login_status)
                .insert_header("set-cookie", "prod_session=tok-1; Path=/; Max-Age=3600"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accessories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "accessoryId": "front-door", "name": "Front Door", "nodeId": node },
            { "accessoryId": "backyard", "name": "Backyard", "nodeId": node }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accessories/front-door"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessoryId": "front-door", "name": "Front Door", "nodeId": node
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accessories/front-door/image"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(JPEG.to_vec(), "image/jpeg"))
        .mount(&server)
        .await;
    server
}

/// Run a prepared command off the async runtime.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = logicircle_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    logicircle_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("cameras")
                .and(predicate::str::contains("snapshot"))
                .and(predicate::str::contains("watch")),
        );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    logicircle_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("logicircle"));
}

#[test]
fn test_completions_zsh() {
    let dir = tempfile::tempdir().unwrap();
    logicircle_cmd(dir.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_format_rejected() {
    let dir = tempfile::tempdir().unwrap();
    logicircle_cmd(dir.path())
        .args(["--format", "xml", "cameras"])
        .assert()
        .failure()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let dir = tempfile::tempdir().unwrap();
    logicircle_cmd(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_redacts_password() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "username = \"a@x.com\"\npassword = \"hunter2\"\nrefresh_interval_secs = 15\n",
    )
    .unwrap();

    let output = logicircle_cmd(dir.path())
        .args(["--format", "json", "config", "show"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["username"], "a@x.com");
    assert_eq!(shown["password"], "********");
    assert_eq!(shown["refresh_interval_secs"], 15);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("hunter2"));
}

#[test]
fn test_cameras_without_account_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = logicircle_cmd(dir.path()).arg("cameras").output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No account configured"));
}

#[test]
fn test_watch_rejects_zero_interval() {
    let dir = tempfile::tempdir().unwrap();
    logicircle_cmd(dir.path())
        .env("LOGICIRCLE_USERNAME", "a@x.com")
        .env("LOGICIRCLE_PASSWORD", "hunter2")
        .args(["watch", "--interval", "0"])
        .assert()
        .failure()
        .code(2);
}

// ── Cloud-bound commands ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_cameras_lists_accessories_as_json() {
    let server = mock_cloud(200).await;
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cloud_cmd(dir.path(), &server);
    cmd.args(["--format", "json", "cameras"]);

    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let cams: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cams[0]["id"], "front-door");
    assert_eq!(cams[1]["name"], "Backyard");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_snapshot_writes_exact_bytes_to_file() {
    let server = mock_cloud(200).await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("front.jpg");
    let mut cmd = cloud_cmd(dir.path(), &server);
    cmd.args(["snapshot", "Front Door", "-o"]).arg(&target);

    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(std::fs::read(&target).unwrap(), JPEG);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_snapshot_unknown_camera_is_not_found() {
    let server = mock_cloud(200).await;
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cloud_cmd(dir.path(), &server);
    cmd.args(["snapshot", "garage", "-o"])
        .arg(dir.path().join("x.jpg"));

    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("garage"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_password_exits_with_auth_code() {
    let server = mock_cloud(401).await;
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cloud_cmd(dir.path(), &server);
    cmd.arg("cameras");

    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Authentication failed"));
}
