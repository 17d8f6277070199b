//! Failure paths that need no container runtime: a runtime binary that does
//! not exist and a missing inventory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn berth() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("berth"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Config pointing at a runtime binary that cannot be found and an
/// inventory path inside the temp dir.
fn broken_runtime_config() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.yaml");
    let inventory = dir.path().join("inventory.ini");
    std::fs::write(
        &path,
        format!(
            "runtime:\n  binary: berth-test-no-such-runtime\ninventory:\n  path: {}\n",
            inventory.display()
        ),
    )
    .unwrap();
    (dir, path.to_string_lossy().into_owned())
}

#[test]
fn test_list_reports_unavailable_runtime() {
    let (_dir, config) = broken_runtime_config();
    berth()
        .arg("list")
        .env("BERTH_CONFIG", &config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Container runtime unavailable"));
}

#[test]
fn test_setup_json_error_has_runtime_code() {
    let (_dir, config) = broken_runtime_config();
    let output = berth()
        .args(["setup", "--yes", "--json", "--no-key-copy"])
        .env("BERTH_CONFIG", &config)
        .output()
        .expect("run berth");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON error");
    assert_eq!(value["code"], "runtime_unavailable");
}

#[test]
fn test_setup_rejects_invalid_user_before_touching_runtime() {
    let (_dir, config) = broken_runtime_config();
    berth()
        .args(["setup", "--yes", "--user", "Bad User"])
        .env("BERTH_CONFIG", &config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for ssh.user"))
        .stderr(predicate::str::contains("runtime").not());
}

#[test]
fn test_ping_without_inventory_explains_next_step() {
    let (_dir, config) = broken_runtime_config();
    berth()
        .arg("ping")
        .env("BERTH_CONFIG", &config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("berth setup"));
}
