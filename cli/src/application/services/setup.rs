//! Application service — the end-to-end `setup` use-case.
//!
//! Provisions the fleet, copies the local public key into every container
//! that ended up with SSH, and writes the inventory for the successful
//! hosts. Imports only from `crate::domain` and `crate::application`.

use std::path::PathBuf;

use anyhow::Result;
use berth_common::{FleetReport, InventoryHost};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::application::ports::{
    ConnectivityVerifier, ContainerRuntime, InventoryWriter, KeyStore, ProgressReporter,
    RemoteExecutor,
};
use crate::application::services::fleet::{self, FleetItem, FleetOptions, FleetRun};
use crate::domain::inventory::{
    InventorySettings, group_hosts, hosts_from_report, render_inventory,
};

/// Options for [`setup`].
pub struct SetupOptions {
    pub fleet: FleetOptions,
    /// Skip installing the local public key.
    pub skip_key_copy: bool,
    pub python_interpreter: String,
}

/// Key copy results, or why the step did not run.
#[derive(Debug)]
pub enum KeyCopy {
    Skipped,
    Failed(String),
    Done(Vec<FleetItem<std::result::Result<(), String>>>),
}

/// Where the inventory went and how many hosts it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryWritten {
    pub path: PathBuf,
    pub hosts: usize,
}

/// Everything `setup` produced.
#[derive(Debug)]
pub struct SetupResult {
    pub run: FleetRun,
    pub key_copy: KeyCopy,
    /// `None` when no target succeeded.
    pub inventory: Option<InventoryWritten>,
}

impl SetupResult {
    #[must_use]
    pub fn report(&self) -> &FleetReport {
        &self.run.report
    }
}

/// Provision, copy keys and write the inventory.
///
/// # Errors
///
/// Returns an error when the runtime cannot be reached or the inventory
/// cannot be written. Key copy problems are reported as warnings.
#[allow(clippy::too_many_arguments)]
pub async fn setup(
    runtime: &impl ContainerRuntime,
    executor: &impl RemoteExecutor,
    verifier: &impl ConnectivityVerifier,
    keys: &impl KeyStore,
    writer: &impl InventoryWriter,
    names: &[String],
    options: &SetupOptions,
    reporter: &impl ProgressReporter,
) -> Result<SetupResult> {
    let run = fleet::run(runtime, executor, verifier, names, &options.fleet, reporter).await?;

    let succeeded: Vec<String> = run
        .report
        .targets
        .iter()
        .filter(|t| t.is_success())
        .map(|t| t.name.clone())
        .collect();

    let key_copy = if options.skip_key_copy || succeeded.is_empty() {
        KeyCopy::Skipped
    } else {
        reporter.step("Installing local public key");
        match fleet::copy_keys(
            runtime,
            executor,
            keys,
            &succeeded,
            &options.fleet.credentials.user,
            options.fleet.pool,
            reporter,
        )
        .await
        {
            Ok(items) => KeyCopy::Done(items),
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(error = %reason, "key copy skipped");
                reporter.warn(&format!("key copy skipped: {reason}"));
                KeyCopy::Failed(reason)
            }
        }
    };

    let hosts = hosts_from_report(&run.report);
    let inventory = if hosts.is_empty() {
        None
    } else {
        let settings = InventorySettings {
            user: options.fleet.credentials.user.clone(),
            password: options.fleet.credentials.password.clone(),
            python_interpreter: options.python_interpreter.clone(),
        };
        Some(write_inventory(writer, hosts, &settings, run.report.generated_at)?)
    };

    Ok(SetupResult {
        run,
        key_copy,
        inventory,
    })
}

/// Group `hosts`, render the INI file and persist it.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_inventory(
    writer: &impl InventoryWriter,
    hosts: Vec<InventoryHost>,
    settings: &InventorySettings,
    generated_at: DateTime<Utc>,
) -> Result<InventoryWritten> {
    let groups = group_hosts(hosts);
    let count = groups.values().map(Vec::len).sum();
    let contents = render_inventory(&groups, settings, generated_at);
    let path = writer.write(&contents)?;
    Ok(InventoryWritten { path, hosts: count })
}
