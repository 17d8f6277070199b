//! Application service — SSH provisioning state machine.
//!
//! Stages run strictly in order with no backward transitions:
//! `CheckRunning → Install → ConfigureUser → StartService → Verify`.
//! Failures are caught per command and folded into the returned
//! [`ProvisioningOutcome`]; this service never returns an error.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use berth_common::{OutcomeKind, PackageManagerKind, VerificationStatus};
use tracing::{debug, info, warn};

use crate::application::ports::{CommandResult, ConnectivityVerifier, RemoteExecutor};
use crate::application::services::connectivity::verify_address;
use crate::domain::error::ProvisionError;
use crate::domain::profile::{
    DEFAULT_DAEMON_COMMAND, InstallProfile, SERVICE_START_COMMANDS, SSHD_RUNNING_PROBE,
    UNIVERSAL_INSTALLERS, UNIVERSAL_POST_INSTALL, profile_for, user_setup_commands,
};
use crate::domain::Target;

/// Longest command output quoted in a failure message.
const MAX_DETAIL_CHARS: usize = 240;

/// Credentials provisioned inside the target and used for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub port: u16,
    /// Private key tried when password authentication is rejected.
    pub identity: Option<PathBuf>,
}

/// Timing knobs of one provisioning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Timeout for the quick `CheckRunning` probe.
    pub probe_timeout: Duration,
    /// Pause between starting sshd and the connectivity check.
    pub settle: Duration,
}

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckRunning,
    Install,
    ConfigureUser,
    StartService,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CheckRunning => "check",
            Self::Install => "install",
            Self::ConfigureUser => "user",
            Self::StartService => "service",
            Self::Verify => "verify",
        })
    }
}

/// One entry in a target's progress trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub stage: Stage,
    pub ok: bool,
    pub message: String,
}

/// Terminal state of one provisioning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningOutcome {
    pub kind: OutcomeKind,
    pub address: Option<String>,
    pub package_manager: PackageManagerKind,
    pub verification: VerificationStatus,
    pub message: Option<String>,
    pub warnings: Vec<String>,
    pub trail: Vec<StageEvent>,
}

/// Accumulates the trail and warnings while the pipeline runs.
struct Run<'a, E> {
    executor: &'a E,
    target: &'a Target,
    package_manager: PackageManagerKind,
    warnings: Vec<String>,
    trail: Vec<StageEvent>,
}

impl<'a, E: RemoteExecutor> Run<'a, E> {
    fn record(&mut self, stage: Stage, ok: bool, message: impl Into<String>) {
        let message = message.into();
        if ok {
            info!(container = %self.target.name, %stage, "{message}");
        } else {
            warn!(container = %self.target.name, %stage, "{message}");
        }
        self.trail.push(StageEvent { stage, ok, message });
    }

    fn warn(&mut self, stage: Stage, warning: String) {
        self.record(stage, false, warning.clone());
        self.warnings.push(warning);
    }

    async fn exec(&self, command: &str, detach: bool) -> anyhow::Result<CommandResult> {
        debug!(container = %self.target.name, command, detach, "exec");
        self.executor.exec(self.target, command, detach).await
    }

    fn finish(
        self,
        kind: OutcomeKind,
        verification: VerificationStatus,
        message: Option<String>,
    ) -> ProvisioningOutcome {
        ProvisioningOutcome {
            kind,
            address: self.target.resolve_address().map(str::to_string),
            package_manager: self.package_manager,
            verification,
            message,
            warnings: self.warnings,
            trail: self.trail,
        }
    }
}

/// Provision SSH access inside `target`.
pub async fn provision(
    executor: &impl RemoteExecutor,
    verifier: &impl ConnectivityVerifier,
    target: &Target,
    kind: PackageManagerKind,
    credentials: &Credentials,
    options: &ProvisionOptions,
) -> ProvisioningOutcome {
    let mut run = Run {
        executor,
        target,
        package_manager: kind,
        warnings: Vec::new(),
        trail: Vec::new(),
    };

    if sshd_running(&run, options.probe_timeout).await {
        run.record(Stage::CheckRunning, true, "SSH daemon already running");
        return run.finish(
            OutcomeKind::AlreadyRunning,
            VerificationStatus::Skipped {
                reason: "SSH daemon was already running".to_string(),
            },
            None,
        );
    }
    run.record(Stage::CheckRunning, true, "SSH daemon not running");

    let profile = profile_for(kind);
    let installed = match profile {
        Some(profile) => install_with_profile(&mut run, profile).await,
        None => install_universal(&mut run).await,
    };
    if let Err(e) = installed {
        let message = e.to_string();
        run.record(Stage::Install, false, message.clone());
        return run.finish(
            OutcomeKind::InstallFailed,
            skipped("installation failed"),
            Some(message),
        );
    }

    configure_user(&mut run, credentials).await;

    let daemon = profile.map_or(DEFAULT_DAEMON_COMMAND, |p| p.service_command);
    if let Err(e) = start_service(&mut run, daemon).await {
        let message = e.to_string();
        run.record(Stage::StartService, false, message.clone());
        return run.finish(
            OutcomeKind::ServiceStartFailed,
            skipped("SSH daemon not started"),
            Some(message),
        );
    }

    let verification = match target.resolve_address() {
        None => {
            run.record(Stage::Verify, true, "no network address; check skipped");
            skipped("container has no network address")
        }
        Some(address) => {
            tokio::time::sleep(options.settle).await;
            let status = verify_address(verifier, address, credentials).await;
            match &status {
                VerificationStatus::Passed { .. } => {
                    run.record(Stage::Verify, true, format!("SSH login to {address} works"));
                }
                VerificationStatus::Failed { reason } => {
                    let warning = ProvisionError::VerificationFailed(reason.clone()).to_string();
                    run.warn(Stage::Verify, warning);
                }
                VerificationStatus::Skipped { reason } => {
                    run.record(Stage::Verify, true, reason.clone());
                }
            }
            status
        }
    };

    run.finish(OutcomeKind::Success, verification, None)
}

fn skipped(reason: &str) -> VerificationStatus {
    VerificationStatus::Skipped {
        reason: reason.to_string(),
    }
}

/// Last part of a command's output, for failure messages.
fn detail(result: &CommandResult) -> String {
    let text = result.text();
    let count = text.chars().count();
    let tail: String = if count > MAX_DETAIL_CHARS {
        text.chars().skip(count - MAX_DETAIL_CHARS).collect()
    } else {
        text
    };
    if tail.is_empty() {
        format!("exit code {}", result.exit_code)
    } else {
        format!("exit code {}: {tail}", result.exit_code)
    }
}

async fn sshd_running<E: RemoteExecutor>(run: &Run<'_, E>, probe_timeout: Duration) -> bool {
    debug!(container = %run.target.name, command = SSHD_RUNNING_PROBE, "exec");
    match run
        .executor
        .exec_with_timeout(run.target, SSHD_RUNNING_PROBE, false, probe_timeout)
        .await
    {
        Ok(result) => result.success() && !result.text().is_empty(),
        Err(e) => {
            debug!(container = %run.target.name, error = %format!("{e:#}"), "sshd probe failed");
            false
        }
    }
}

async fn install_with_profile<E: RemoteExecutor>(
    run: &mut Run<'_, E>,
    profile: &InstallProfile,
) -> Result<(), ProvisionError> {
    let command = profile.install_command();
    match run.exec(&command, false).await {
        Ok(result) if result.success() => {
            run.record(
                Stage::Install,
                true,
                format!("installed {} with {}", profile.packages.join(" "), profile.kind),
            );
        }
        Ok(result) => return Err(ProvisionError::InstallFailed(detail(&result))),
        Err(e) => return Err(ProvisionError::InstallFailed(format!("{e:#}"))),
    }

    for step in profile.post_install {
        best_effort(run, Stage::Install, step).await;
    }
    Ok(())
}

async fn install_universal<E: RemoteExecutor>(
    run: &mut Run<'_, E>,
) -> Result<(), ProvisionError> {
    let name = run.target.name.clone();
    run.warn(
        Stage::Install,
        ProvisionError::DetectionInconclusive(name).to_string(),
    );

    for (kind, command) in UNIVERSAL_INSTALLERS {
        match run.exec(command, false).await {
            Ok(result) if result.success() => {
                run.record(Stage::Install, true, format!("universal installer ({kind}) succeeded"));
                for step in UNIVERSAL_POST_INSTALL {
                    best_effort(run, Stage::Install, step).await;
                }
                return Ok(());
            }
            Ok(result) => debug!(container = %run.target.name, %kind, "{}", detail(&result)),
            Err(e) => debug!(container = %run.target.name, %kind, error = %format!("{e:#}"), "installer did not run"),
        }
    }
    Err(ProvisionError::InstallFailed(
        "no universal installer succeeded".to_string(),
    ))
}

/// Run a command whose failure is only a warning.
async fn best_effort<E: RemoteExecutor>(run: &mut Run<'_, E>, stage: Stage, command: &str) {
    match run.exec(command, false).await {
        Ok(result) if result.success() => {}
        Ok(result) => run.warn(stage, format!("`{command}` failed ({})", detail(&result))),
        Err(e) => run.warn(stage, format!("`{command}` did not run: {e:#}")),
    }
}

async fn configure_user<E: RemoteExecutor>(run: &mut Run<'_, E>, credentials: &Credentials) {
    let before = run.warnings.len();
    for command in user_setup_commands(&credentials.user, &credentials.password) {
        let failure = match run.exec(&command, false).await {
            Ok(result) if result.success() => continue,
            Ok(result) => detail(&result),
            Err(e) => format!("{e:#}"),
        };
        // The password is part of the chpasswd line; report only the step.
        let step = command.split_whitespace().next().unwrap_or_default().to_string();
        let warning = ProvisionError::UserSetupFailed(format!("{step}: {failure}")).to_string();
        run.warn(Stage::ConfigureUser, warning);
    }
    if run.warnings.len() == before {
        run.record(
            Stage::ConfigureUser,
            true,
            format!("user '{}' ready", credentials.user),
        );
    }
}

async fn start_service<E: RemoteExecutor>(
    run: &mut Run<'_, E>,
    daemon: &str,
) -> Result<(), ProvisionError> {
    for command in SERVICE_START_COMMANDS {
        match run.exec(command, false).await {
            Ok(result) if result.success() => {
                run.record(Stage::StartService, true, format!("started with `{command}`"));
                return Ok(());
            }
            Ok(result) => debug!(container = %run.target.name, command, "{}", detail(&result)),
            Err(e) => debug!(container = %run.target.name, command, error = %format!("{e:#}"), "start attempt did not run"),
        }
    }

    match run.exec(daemon, true).await {
        Ok(result) if result.success() => {
            run.record(
                Stage::StartService,
                true,
                format!("launched `{daemon}` in the background"),
            );
            Ok(())
        }
        Ok(result) => Err(ProvisionError::ServiceStartFailed(detail(&result))),
        Err(e) => Err(ProvisionError::ServiceStartFailed(format!("{e:#}"))),
    }
}
