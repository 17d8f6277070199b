//! Integration tests for `berth config`.
//!
//! Every test sets `BERTH_CONFIG` to a temp path so it never reads or writes
//! `~/.berth/config.yaml`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn berth() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("berth"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Returns a `TempDir` and the path string for a config file inside it.
fn temp_config_path() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir
        .path()
        .join("config.yaml")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

// ---------------------------------------------------------------------------
// Subcommand registration
// ---------------------------------------------------------------------------

#[test]
fn test_config_help_shows_subcommands() {
    berth()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("path"));
}

// ---------------------------------------------------------------------------
// `berth config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_show_without_file_uses_defaults() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "show"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ssh.user"))
        .stdout(predicate::str::contains("ansible"))
        .stdout(predicate::str::contains("docker-inventory.ini"))
        .stdout(predicate::str::contains("BERTH_CONFIG"));
}

#[test]
fn test_config_show_masks_password() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "show"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ansible123").not());
}

#[test]
fn test_config_show_does_not_create_file() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "show"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success();
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_show_json_is_parseable() {
    let (_dir, path) = temp_config_path();
    let output = berth()
        .args(["config", "show", "--json"])
        .env("BERTH_CONFIG", &path)
        .output()
        .expect("run berth");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    assert_eq!(value["config"]["ssh"]["user"], "ansible");
    assert_eq!(value["config"]["ssh"]["port"], 22);
    assert_eq!(value["config"]["ssh"]["password"], "********");
    assert_eq!(value["path"], path.as_str());
}

// ---------------------------------------------------------------------------
// `berth config set`
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_then_show_round_trips() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "set", "ssh.user", "deploy"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Set ssh.user = deploy"));

    berth()
        .args(["config", "show"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"));

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("deploy"));
}

#[test]
fn test_config_set_password_is_masked_in_confirmation() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "set", "ssh.password", "hunter2"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2").not());
}

#[cfg(unix)]
#[test]
fn test_config_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "set", "fleet.concurrency", "8"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_config_set_unknown_key_fails() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "set", "ssh.shell", "zsh"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting: ssh.shell"))
        .stderr(predicate::str::contains("ssh.port"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_invalid_port_fails() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "set", "ssh.port", "70000"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for ssh.port: 70000"));
}

#[test]
fn test_config_set_invalid_user_fails() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "set", "ssh.user", "root;reboot"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for ssh.user"));
}

#[test]
fn test_config_set_invalid_key_json_error() {
    let (_dir, path) = temp_config_path();
    let output = berth()
        .args(["config", "set", "nope", "1", "--json"])
        .env("BERTH_CONFIG", &path)
        .output()
        .expect("run berth");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON error");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "invalid_config");
}

// ---------------------------------------------------------------------------
// `berth config path`
// ---------------------------------------------------------------------------

#[test]
fn test_config_path_honours_env_override() {
    let (_dir, path) = temp_config_path();
    berth()
        .args(["config", "path"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains(path.as_str()));
}

// ---------------------------------------------------------------------------
// Hand-edited config files
// ---------------------------------------------------------------------------

fn write_config(path: &str, yaml: &str) {
    std::fs::write(path, yaml).expect("write config");
}

#[test]
fn test_commands_reject_hand_edited_user() {
    let (_dir, path) = temp_config_path();
    write_config(
        &path,
        "runtime:\n  binary: berth-test-no-such-runtime\nssh:\n  user: \"x; touch /pwned\"\n",
    );
    berth()
        .arg("list")
        .env("BERTH_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration in"))
        .stderr(predicate::str::contains("Invalid value for ssh.user"))
        .stderr(predicate::str::contains("Container runtime unavailable").not());
}

#[test]
fn test_setup_json_reports_invalid_stored_timeout() {
    let (_dir, path) = temp_config_path();
    write_config(
        &path,
        "runtime:\n  binary: berth-test-no-such-runtime\ntimeouts:\n  target_deadline_secs: 0\n",
    );
    let output = berth()
        .args(["setup", "--yes", "--json", "--no-key-copy"])
        .env("BERTH_CONFIG", &path)
        .output()
        .expect("run berth");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON error");
    assert_eq!(value["code"], "invalid_config");
}

#[test]
fn test_config_set_repairs_invalid_stored_value() {
    let (_dir, path) = temp_config_path();
    write_config(&path, "fleet:\n  concurrency: 100000\n");
    berth()
        .args(["config", "set", "fleet.concurrency", "8"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success();
    berth()
        .args(["config", "show"])
        .env("BERTH_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("8"));
}
