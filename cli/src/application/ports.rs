//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{BerthConfig, Target, VerifyError};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of a command executed inside a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    /// Combined stdout and stderr.
    pub output: Vec<u8>,
}

impl CommandResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Output decoded lossily, trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).trim().to_string()
    }
}

/// How the connectivity check authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password(String),
    /// Private key file.
    Key(PathBuf),
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration)
    -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<std::process::ExitStatus>;
}

// ── Container Ports ───────────────────────────────────────────────────────────

/// Runs shell commands inside a target container.
///
/// An `Err` means the command could not be run at all (runtime refused it,
/// timed out, spawn failure); a command that ran and failed is an `Ok` with a
/// non-zero exit code.
#[allow(async_fn_in_trait)]
pub trait RemoteExecutor {
    /// Execute `command` with the default exec timeout.
    async fn exec(&self, target: &Target, command: &str, detach: bool) -> Result<CommandResult>;
    /// Execute `command`, killing it after `timeout`.
    async fn exec_with_timeout(
        &self,
        target: &Target,
        command: &str,
        detach: bool,
        timeout: Duration,
    ) -> Result<CommandResult>;
}

/// Container discovery.
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// Check that the runtime daemon is reachable.
    async fn ping(&self) -> Result<()>;
    /// All running containers.
    async fn list(&self) -> Result<Vec<Target>>;
    /// Look up a container by name or id; `None` when it does not exist.
    async fn get(&self, name: &str) -> Result<Option<Target>>;
}

// ── SSH Ports ─────────────────────────────────────────────────────────────────

/// Opens an SSH session to a provisioned target and runs the canary command.
#[allow(async_fn_in_trait)]
pub trait ConnectivityVerifier {
    /// Returns the canary command's output on success.
    async fn connect(
        &self,
        address: &str,
        port: u16,
        username: &str,
        credential: &Credential,
    ) -> std::result::Result<String, VerifyError>;
}

/// Local SSH key pair used for key copy.
#[allow(async_fn_in_trait)]
pub trait KeyStore {
    /// Generate the key pair if absent and return the public key text.
    async fn ensure_key_pair(&self) -> Result<String>;
    /// Path of the private key.
    fn identity_path(&self) -> PathBuf;
}

// ── Persistence Ports ─────────────────────────────────────────────────────────

/// Persists the rendered inventory.
pub trait InventoryWriter {
    /// Write `contents` and return the file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write(&self, contents: &str) -> Result<PathBuf>;
}

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<BerthConfig>;
    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &BerthConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
