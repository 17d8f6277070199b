//! Application service — fleet orchestration.
//!
//! Resolves the requested containers, then runs a per-target operation on a
//! bounded pool under a per-target deadline. Every requested name yields
//! exactly one item, in request order. Only an unreachable runtime aborts a
//! run.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use berth_common::{
    FleetReport, InventoryHost, PackageManagerKind, TargetReport, TargetResult, VerificationStatus,
};
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::application::ports::{
    ConnectivityVerifier, ContainerRuntime, KeyStore, ProgressReporter, RemoteExecutor,
};
use crate::application::services::connectivity::verify_address;
use crate::application::services::detect::detect;
use crate::application::services::key_copy::authorize_key;
use crate::application::services::provision::{
    Credentials, ProvisionOptions, ProvisioningOutcome, StageEvent, provision,
};
use crate::domain::error::ProvisionError;
use crate::domain::{BerthConfig, Detection, Target};

// ── Options ──────────────────────────────────────────────────────────────────

/// Worker pool bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Targets in flight at once; `1` is strictly sequential.
    pub concurrency: usize,
    /// Wall-clock budget for one target.
    pub deadline: Duration,
}

/// Everything a provisioning run needs besides its ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetOptions {
    pub pool: PoolOptions,
    pub credentials: Credentials,
    pub provision: ProvisionOptions,
}

impl FleetOptions {
    /// Options from configuration. `identity` is the key tried when the
    /// password is rejected during verification.
    #[must_use]
    pub fn from_config(config: &BerthConfig, identity: Option<PathBuf>) -> Self {
        Self {
            pool: PoolOptions {
                concurrency: config.fleet.concurrency.max(1),
                deadline: config.timeouts.target_deadline(),
            },
            credentials: Credentials {
                user: config.ssh.user.clone(),
                password: config.ssh.password.clone(),
                port: config.ssh.port,
                identity,
            },
            provision: ProvisionOptions {
                probe_timeout: config.timeouts.probe(),
                settle: config.timeouts.settle(),
            },
        }
    }
}

// ── Items ────────────────────────────────────────────────────────────────────

/// How one requested target ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult<T> {
    Done(T),
    NotFound(String),
    TimedOut(Duration),
}

/// Result of a fleet operation for one requested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetItem<T> {
    pub name: String,
    /// `None` when the name did not resolve.
    pub target: Option<Target>,
    pub result: ItemResult<T>,
}

/// Detection plus provisioning for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub detection: Detection,
    pub outcome: ProvisioningOutcome,
}

/// Output of [`run`]: the report plus each target's stage trail.
#[derive(Debug, Clone)]
pub struct FleetRun {
    pub report: FleetReport,
    pub trails: Vec<(String, Vec<StageEvent>)>,
}

/// One-line progress summary of a finished item.
pub trait ItemSummary {
    /// `(succeeded, message)`.
    fn summary(&self) -> (bool, String);
}

impl ItemSummary for Provisioned {
    fn summary(&self) -> (bool, String) {
        let report_kind = match &self.outcome.verification {
            VerificationStatus::Failed { .. } if self.outcome.kind.is_success() => {
                "SSH ready, login check failed".to_string()
            }
            _ => self.outcome.kind.to_string(),
        };
        (
            self.outcome.kind.is_success(),
            format!("{report_kind} ({})", self.detection.kind),
        )
    }
}

impl ItemSummary for Detection {
    fn summary(&self) -> (bool, String) {
        match self.strategy {
            Some(strategy) => (true, format!("{} (by {strategy})", self.kind)),
            None => (true, self.kind.to_string()),
        }
    }
}

impl ItemSummary for VerificationStatus {
    fn summary(&self) -> (bool, String) {
        match self {
            Self::Passed { .. } => (true, "SSH login works".to_string()),
            Self::Failed { reason } => (false, reason.clone()),
            Self::Skipped { reason } => (true, format!("skipped: {reason}")),
        }
    }
}

impl ItemSummary for std::result::Result<(), String> {
    fn summary(&self) -> (bool, String) {
        match self {
            Ok(()) => (true, "public key installed".to_string()),
            Err(e) => (false, e.clone()),
        }
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

enum Resolution {
    Found(Target),
    Missing { name: String, reason: String },
}

/// Check the runtime and turn the requested names into targets.
///
/// No names means every running container. A name that resolves to a
/// container already requested is dropped.
async fn resolve(runtime: &impl ContainerRuntime, names: &[String]) -> Result<Vec<Resolution>> {
    runtime
        .ping()
        .await
        .map_err(|e| ProvisionError::RuntimeUnavailable(format!("{e:#}")))?;

    if names.is_empty() {
        let targets = runtime.list().await.context("listing running containers")?;
        return Ok(targets.into_iter().map(Resolution::Found).collect());
    }

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        match runtime.get(name).await {
            Ok(Some(target)) => {
                if seen.insert(target.id.clone()) {
                    resolved.push(Resolution::Found(target));
                } else {
                    info!(container = %name, "duplicate target skipped");
                }
            }
            Ok(None) => resolved.push(Resolution::Missing {
                name: name.clone(),
                reason: ProvisionError::TargetNotFound(name.clone()).to_string(),
            }),
            Err(e) => resolved.push(Resolution::Missing {
                name: name.clone(),
                reason: format!("{e:#}"),
            }),
        }
    }
    Ok(resolved)
}

/// Run `op` for every requested target on the bounded pool.
async fn for_each_target<T, F, Fut>(
    runtime: &impl ContainerRuntime,
    names: &[String],
    pool: PoolOptions,
    reporter: &impl ProgressReporter,
    op: F,
) -> Result<Vec<FleetItem<T>>>
where
    T: ItemSummary,
    F: Fn(Target) -> Fut,
    Fut: Future<Output = T>,
{
    let resolved = resolve(runtime, names).await?;
    let op = &op;

    let mut pending = stream::iter(resolved)
        .map(|resolution| async move {
            match resolution {
                Resolution::Missing { name, reason } => FleetItem {
                    name,
                    target: None,
                    result: ItemResult::NotFound(reason),
                },
                Resolution::Found(target) => {
                    let result = match tokio::time::timeout(pool.deadline, op(target.clone())).await
                    {
                        Ok(value) => ItemResult::Done(value),
                        Err(_) => {
                            warn!(container = %target.name, deadline = ?pool.deadline, "target timed out");
                            ItemResult::TimedOut(pool.deadline)
                        }
                    };
                    FleetItem {
                        name: target.name.clone(),
                        target: Some(target),
                        result,
                    }
                }
            }
        })
        .buffered(pool.concurrency.max(1));

    let mut items = Vec::new();
    while let Some(item) = pending.next().await {
        report_item(reporter, &item);
        items.push(item);
    }
    Ok(items)
}

fn report_item<T: ItemSummary>(reporter: &impl ProgressReporter, item: &FleetItem<T>) {
    match &item.result {
        ItemResult::Done(value) => {
            let (ok, message) = value.summary();
            if ok {
                reporter.success(&format!("{}: {message}", item.name));
            } else {
                reporter.warn(&format!("{}: {message}", item.name));
            }
        }
        ItemResult::NotFound(reason) => reporter.warn(&format!("{}: {reason}", item.name)),
        ItemResult::TimedOut(after) => reporter.warn(&format!(
            "{}: timed out after {}s",
            item.name,
            after.as_secs()
        )),
    }
}

// ── Operations ───────────────────────────────────────────────────────────────

/// Detect and provision every requested target.
///
/// # Errors
///
/// Returns `ProvisionError::RuntimeUnavailable` when the runtime cannot be
/// reached; per-target failures are recorded in the report instead.
pub async fn run(
    runtime: &impl ContainerRuntime,
    executor: &impl RemoteExecutor,
    verifier: &impl ConnectivityVerifier,
    names: &[String],
    options: &FleetOptions,
    reporter: &impl ProgressReporter,
) -> Result<FleetRun> {
    let items = for_each_target(runtime, names, options.pool, reporter, move |target| async move {
        let detection = detect(executor, &target, options.provision.probe_timeout).await;
        let outcome = provision(
            executor,
            verifier,
            &target,
            detection.kind,
            &options.credentials,
            &options.provision,
        )
        .await;
        Provisioned { detection, outcome }
    })
    .await?;

    let mut trails = Vec::new();
    let mut targets = Vec::with_capacity(items.len());
    for item in items {
        if let ItemResult::Done(provisioned) = &item.result {
            trails.push((item.name.clone(), provisioned.outcome.trail.clone()));
        }
        targets.push(target_report(item));
    }
    Ok(FleetRun {
        report: FleetReport::new(targets),
        trails,
    })
}

fn target_report(item: FleetItem<Provisioned>) -> TargetReport {
    let Some(target) = item.target else {
        let reason = match item.result {
            ItemResult::NotFound(reason) => reason,
            _ => ProvisionError::TargetNotFound(item.name.clone()).to_string(),
        };
        return TargetReport::not_found(&item.name, reason);
    };
    let (package_manager, detected_by, address, result) = match item.result {
        ItemResult::Done(Provisioned { detection, outcome }) => (
            detection.kind,
            detection.strategy,
            outcome.address,
            TargetResult::Completed {
                outcome: outcome.kind,
                verification: outcome.verification,
                message: outcome.message,
                warnings: outcome.warnings,
            },
        ),
        ItemResult::TimedOut(after) => (
            PackageManagerKind::Unknown,
            None,
            target.resolve_address().map(str::to_string),
            TargetResult::TimedOut {
                after_secs: after.as_secs(),
            },
        ),
        ItemResult::NotFound(reason) => (
            PackageManagerKind::Unknown,
            None,
            None,
            TargetResult::NotFound { reason },
        ),
    };
    TargetReport {
        name: item.name,
        container_id: Some(target.id),
        image: Some(target.image),
        address,
        package_manager,
        detected_by,
        result,
    }
}

/// Detect the package manager of every requested target without changing
/// anything.
///
/// # Errors
///
/// Returns an error when the runtime cannot be reached.
pub async fn survey(
    runtime: &impl ContainerRuntime,
    executor: &impl RemoteExecutor,
    names: &[String],
    pool: PoolOptions,
    probe_timeout: Duration,
    reporter: &impl ProgressReporter,
) -> Result<Vec<FleetItem<Detection>>> {
    for_each_target(runtime, names, pool, reporter, move |target| async move {
        detect(executor, &target, probe_timeout).await
    })
    .await
}

/// Inventory hosts from a survey: every detected target with an address.
#[must_use]
pub fn survey_hosts(items: &[FleetItem<Detection>]) -> Vec<InventoryHost> {
    items
        .iter()
        .filter_map(|item| match (&item.target, &item.result) {
            (Some(target), ItemResult::Done(detection)) => Some(InventoryHost {
                name: target.name.clone(),
                address: target.resolve_address()?.to_string(),
                container_id: target.id.clone(),
                package_manager: detection.kind,
            }),
            _ => None,
        })
        .collect()
}

/// Check SSH login on every requested target that has an address.
///
/// # Errors
///
/// Returns an error when the runtime cannot be reached.
pub async fn verify(
    runtime: &impl ContainerRuntime,
    verifier: &impl ConnectivityVerifier,
    names: &[String],
    credentials: &Credentials,
    pool: PoolOptions,
    reporter: &impl ProgressReporter,
) -> Result<Vec<FleetItem<VerificationStatus>>> {
    for_each_target(runtime, names, pool, reporter, move |target| async move {
        match target.resolve_address() {
            Some(address) => verify_address(verifier, address, credentials).await,
            None => VerificationStatus::Skipped {
                reason: "container has no network address".to_string(),
            },
        }
    })
    .await
}

/// Install the local public key for `user` in every requested target.
///
/// # Errors
///
/// Returns an error when the runtime cannot be reached or the local key pair
/// cannot be created.
pub async fn copy_keys(
    runtime: &impl ContainerRuntime,
    executor: &impl RemoteExecutor,
    keys: &impl KeyStore,
    names: &[String],
    user: &str,
    pool: PoolOptions,
    reporter: &impl ProgressReporter,
) -> Result<Vec<FleetItem<std::result::Result<(), String>>>> {
    let public_key = keys
        .ensure_key_pair()
        .await
        .context("preparing local SSH key pair")?;
    let public_key = public_key.as_str();
    for_each_target(runtime, names, pool, reporter, move |target| async move {
        authorize_key(executor, &target, user, public_key)
            .await
            .map_err(|e| format!("{e:#}"))
    })
    .await
}
