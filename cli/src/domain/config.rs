//! Domain types and validators for berth configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "runtime.binary",
    "ssh.user",
    "ssh.password",
    "ssh.port",
    "ssh.identity",
    "inventory.path",
    "inventory.python_interpreter",
    "fleet.concurrency",
    "timeouts.probe_secs",
    "timeouts.exec_secs",
    "timeouts.connect_secs",
    "timeouts.target_deadline_secs",
    "timeouts.settle_millis",
];

pub const MAX_CONCURRENCY: usize = 64;

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // compile-time constant pattern
    Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("valid username regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.berth/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BerthConfig {
    pub runtime: RuntimeConfig,
    pub ssh: SshConfig,
    pub inventory: InventoryConfig,
    pub fleet: FleetConfig,
    pub timeouts: TimeoutConfig,
}

/// Container runtime CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Docker-compatible binary, e.g. `docker` or `podman`.
    pub binary: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }
}

/// Credentials provisioned inside every container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SshConfig {
    pub user: String,
    pub password: String,
    pub port: u16,
    /// Private key used for key copy and key-based verification.
    /// Defaults to `~/.berth/keys/id_ed25519` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: "ansible".to_string(),
            password: "ansible123".to_string(),
            port: 22,
            identity: None,
        }
    }
}

/// Inventory file generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InventoryConfig {
    pub path: String,
    pub python_interpreter: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: "docker-inventory.ini".to_string(),
            python_interpreter: "/usr/bin/python3".to_string(),
        }
    }
}

/// Fleet worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FleetConfig {
    /// Targets processed at once; `1` is strictly sequential.
    pub concurrency: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Timeouts applied to remote commands and connectivity checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub probe_secs: u64,
    pub exec_secs: u64,
    pub connect_secs: u64,
    pub target_deadline_secs: u64,
    /// Pause between starting sshd and the connectivity check.
    pub settle_millis: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: 15,
            exec_secs: 600,
            connect_secs: 10,
            target_deadline_secs: 900,
            settle_millis: 2000,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    #[must_use]
    pub fn exec(&self) -> Duration {
        Duration::from_secs(self.exec_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub fn target_deadline(&self) -> Duration {
        Duration::from_secs(self.target_deadline_secs)
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}

impl BerthConfig {
    /// Read a setting by dotted key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a known setting.
    pub fn get(&self, key: &str) -> Result<String> {
        validate_config_key(key)?;
        Ok(match key {
            "runtime.binary" => self.runtime.binary.clone(),
            "ssh.user" => self.ssh.user.clone(),
            "ssh.password" => self.ssh.password.clone(),
            "ssh.port" => self.ssh.port.to_string(),
            "ssh.identity" => self.ssh.identity.clone().unwrap_or_default(),
            "inventory.path" => self.inventory.path.clone(),
            "inventory.python_interpreter" => self.inventory.python_interpreter.clone(),
            "fleet.concurrency" => self.fleet.concurrency.to_string(),
            "timeouts.probe_secs" => self.timeouts.probe_secs.to_string(),
            "timeouts.exec_secs" => self.timeouts.exec_secs.to_string(),
            "timeouts.connect_secs" => self.timeouts.connect_secs.to_string(),
            "timeouts.target_deadline_secs" => self.timeouts.target_deadline_secs.to_string(),
            _ => self.timeouts.settle_millis.to_string(),
        })
    }

    /// Check every setting against the same rules `set` applies.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting, in whitelist order.
    pub fn validate(&self) -> Result<()> {
        for key in VALID_CONFIG_KEYS {
            validate_config_value(key, &self.get(key)?)?;
        }
        Ok(())
    }

    /// Validate and apply a setting by dotted key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid for it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "runtime.binary" => self.runtime.binary = value.to_string(),
            "ssh.user" => self.ssh.user = value.to_string(),
            "ssh.password" => self.ssh.password = value.to_string(),
            "ssh.port" => self.ssh.port = parse_number(key, value, "a port between 1 and 65535")?,
            "ssh.identity" => {
                self.ssh.identity = (!value.is_empty()).then(|| value.to_string());
            }
            "inventory.path" => self.inventory.path = value.to_string(),
            "inventory.python_interpreter" => {
                self.inventory.python_interpreter = value.to_string();
            }
            "fleet.concurrency" => {
                self.fleet.concurrency = parse_number(key, value, "a positive integer")?;
            }
            "timeouts.probe_secs" => self.timeouts.probe_secs = parse_seconds(key, value)?,
            "timeouts.exec_secs" => self.timeouts.exec_secs = parse_seconds(key, value)?,
            "timeouts.connect_secs" => self.timeouts.connect_secs = parse_seconds(key, value)?,
            "timeouts.target_deadline_secs" => {
                self.timeouts.target_deadline_secs = parse_seconds(key, value)?;
            }
            _ => self.timeouts.settle_millis = parse_number(key, value, "milliseconds")?,
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str, valid: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: valid.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str, valid: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| invalid(key, value, valid).into())
}

fn parse_seconds(key: &str, value: &str) -> Result<u64> {
    parse_number(key, value, "a positive number of seconds")
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    match key {
        "ssh.user" => validate_username(value),
        "ssh.port" => match value.parse::<u16>() {
            Ok(port) if port > 0 => Ok(()),
            _ => Err(invalid(key, value, "a port between 1 and 65535").into()),
        },
        "fleet.concurrency" => match value.parse::<usize>() {
            Ok(n) if (1..=MAX_CONCURRENCY).contains(&n) => Ok(()),
            _ => Err(invalid(key, value, &format!("an integer between 1 and {MAX_CONCURRENCY}")).into()),
        },
        "timeouts.probe_secs"
        | "timeouts.exec_secs"
        | "timeouts.connect_secs"
        | "timeouts.target_deadline_secs" => match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err(invalid(key, value, "a positive number of seconds").into()),
        },
        "runtime.binary" | "inventory.path" | "inventory.python_interpreter"
            if value.trim().is_empty() =>
        {
            Err(invalid(key, value, "a non-empty value").into())
        }
        _ => Ok(()),
    }
}

/// Validates a container user name (portable POSIX subset).
///
/// # Errors
///
/// Returns an error if the name could not be used safely in shell commands.
pub fn validate_username(name: &str) -> Result<()> {
    if USERNAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(invalid("ssh.user", name, "^[a-z_][a-z0-9_-]{0,31}$").into())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
