//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Failure taxonomy of a fleet run.
///
/// Only `RuntimeUnavailable` aborts a whole run; every other variant is caught
/// at the smallest scope and folded into the affected target's outcome.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Could not determine the package manager of '{0}'; using the universal installer.")]
    DetectionInconclusive(String),

    #[error("SSH package installation failed: {0}")]
    InstallFailed(String),

    #[error("User setup step failed: {0}")]
    UserSetupFailed(String),

    #[error("Could not start the SSH daemon: {0}")]
    ServiceStartFailed(String),

    #[error("SSH connectivity check failed: {0}")]
    VerificationFailed(String),

    #[error("Container '{0}' not found.")]
    TargetNotFound(String),

    #[error(
        "Container runtime unavailable: {0}\n\nMake sure the runtime is running and you have permission to use it."
    )]
    RuntimeUnavailable(String),
}

// ── Connectivity errors ───────────────────────────────────────────────────────

/// Errors reported by a `ConnectivityVerifier`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("authentication rejected for {0}")]
    Auth(String),

    #[error("cannot connect: {0}")]
    Connect(String),

    #[error("session error: {0}")]
    Session(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
