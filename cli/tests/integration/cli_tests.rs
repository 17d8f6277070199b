//! Integration tests for the berth CLI surface: help, version and the
//! command hierarchy.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn berth() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("berth"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    berth().assert().code(2).stderr(predicate::str::contains(
        "SSH bootstrap for running containers",
    ));
}

#[test]
fn test_cli_help_flag_shows_help() {
    berth()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    berth()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("berth"));
}

#[test]
fn test_version_command_shows_version() {
    berth()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("berth 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = berth()
        .args(["version", "--json"])
        .output()
        .expect("run berth");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["version"], "0.1.0");
}

// --- Command hierarchy tests ---

#[test]
fn test_help_lists_every_command() {
    let output = berth().arg("--help").output().expect("run berth");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in [
        "setup",
        "list",
        "verify",
        "inventory",
        "key-copy",
        "ping",
        "shell",
        "config",
        "version",
    ] {
        assert!(help.contains(command), "help is missing `{command}`:\n{help}");
    }
}

#[test]
fn test_setup_help_shows_overrides() {
    berth()
        .args(["setup", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--containers"))
        .stdout(predicate::str::contains("--user"))
        .stdout(predicate::str::contains("--password"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--no-key-copy"));
}

#[test]
fn test_setup_rejects_port_zero() {
    berth()
        .args(["setup", "--port", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("0"));
}

#[test]
fn test_unknown_command_fails() {
    berth()
        .arg("provision-everything")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_shell_requires_a_command() {
    berth()
        .arg("shell")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<COMMAND>"));
}
