//! Shared test doubles for application service tests.
//!
//! `ScriptedExecutor` answers commands by prefix and records every call so
//! tests can assert exact command sequences and call counts.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{
    CommandResult, ConnectivityVerifier, ContainerRuntime, Credential, KeyStore, ProgressReporter,
    RemoteExecutor,
};
use crate::domain::{Target, VerifyError};

/// Canned reaction to a command.
#[derive(Debug, Clone)]
pub enum Reply {
    Exit(i32, &'static str),
    /// The executor itself fails (runtime refused, spawn error).
    Error(&'static str),
    /// Never completes within any sane test deadline.
    Hang,
}

/// One recorded `exec` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target: String,
    pub command: String,
    pub detach: bool,
}

/// Executor answering by command prefix; unmatched commands exit 1.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Vec<(Option<String>, String, Reply)>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to any command starting with `prefix`.
    #[must_use]
    pub fn on(mut self, prefix: &str, reply: Reply) -> Self {
        self.rules.push((None, prefix.to_string(), reply));
        self
    }

    /// Reply to commands starting with `prefix` on the named target only.
    #[must_use]
    pub fn on_target(mut self, target: &str, prefix: &str, reply: Reply) -> Self {
        self.rules
            .push((Some(target.to_string()), prefix.to_string(), reply));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn reply_for(&self, target: &str, command: &str) -> Reply {
        self.rules
            .iter()
            .find(|(only, prefix, _)| {
                only.as_deref().is_none_or(|t| t == target) && command.starts_with(prefix.as_str())
            })
            .map_or(Reply::Exit(1, ""), |(_, _, reply)| reply.clone())
    }
}

impl RemoteExecutor for ScriptedExecutor {
    async fn exec(&self, target: &Target, command: &str, detach: bool) -> Result<CommandResult> {
        self.exec_with_timeout(target, command, detach, Duration::from_secs(600))
            .await
    }

    async fn exec_with_timeout(
        &self,
        target: &Target,
        command: &str,
        detach: bool,
        _timeout: Duration,
    ) -> Result<CommandResult> {
        self.calls.lock().unwrap().push(Call {
            target: target.name.clone(),
            command: command.to_string(),
            detach,
        });
        match self.reply_for(&target.name, command) {
            Reply::Exit(code, output) => Ok(CommandResult {
                exit_code: code,
                output: output.as_bytes().to_vec(),
            }),
            Reply::Error(msg) => anyhow::bail!("{msg}"),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                anyhow::bail!("hung command returned")
            }
        }
    }
}

/// Verifier with fixed replies per credential type.
pub struct StubVerifier {
    pub password: std::result::Result<String, VerifyError>,
    pub key: std::result::Result<String, VerifyError>,
    pub calls: Mutex<Vec<(String, Credential)>>,
}

impl StubVerifier {
    pub fn passing() -> Self {
        Self {
            password: Ok("SSH connection successful".to_string()),
            key: Ok("SSH connection successful".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_password() -> Self {
        Self {
            password: Err(VerifyError::Auth("ansible".to_string())),
            ..Self::passing()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ConnectivityVerifier for StubVerifier {
    async fn connect(
        &self,
        address: &str,
        _port: u16,
        _username: &str,
        credential: &Credential,
    ) -> std::result::Result<String, VerifyError> {
        self.calls
            .lock()
            .unwrap()
            .push((address.to_string(), credential.clone()));
        match credential {
            Credential::Password(_) => self.password.clone(),
            Credential::Key(_) => self.key.clone(),
        }
    }
}

/// Runtime backed by a fixed container list.
pub struct StubRuntime {
    pub up: bool,
    pub targets: Vec<Target>,
}

impl StubRuntime {
    pub fn with(targets: Vec<Target>) -> Self {
        Self { up: true, targets }
    }
}

impl ContainerRuntime for StubRuntime {
    async fn ping(&self) -> Result<()> {
        if self.up {
            Ok(())
        } else {
            anyhow::bail!("Cannot connect to the Docker daemon")
        }
    }

    async fn list(&self) -> Result<Vec<Target>> {
        Ok(self.targets.iter().filter(|t| t.is_running()).cloned().collect())
    }

    async fn get(&self, name: &str) -> Result<Option<Target>> {
        Ok(self
            .targets
            .iter()
            .find(|t| t.name == name || t.id == name)
            .cloned())
    }
}

/// Key store returning a fixed public key.
pub struct StubKeyStore;

impl KeyStore for StubKeyStore {
    async fn ensure_key_pair(&self) -> Result<String> {
        Ok("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAI berth@test".to_string())
    }

    fn identity_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from("/tmp/berth-test/id_ed25519")
    }
}

/// A running target with the given image and optional primary address.
pub fn target(name: &str, image: &str, address: Option<&str>) -> Target {
    Target {
        id: format!("{name}-0123456789abcdef"),
        name: name.to_string(),
        image: image.to_string(),
        status: "running".to_string(),
        address: address.map(str::to_string),
        networks: Vec::new(),
        labels: BTreeMap::new(),
    }
}

/// Reporter that records every message.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("ok: {message}"));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("warn: {message}"));
    }
}
