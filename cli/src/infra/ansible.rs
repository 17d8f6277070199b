//! Ansible CLI adapter for ad-hoc modules against the generated inventory.

use std::path::Path;
use std::process::ExitStatus;

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::CommandRunner;
use crate::domain::inventory::ALL_GROUP;

/// Runs `ansible <pattern> -i <inventory> -m <module>` with inherited stdio.
pub struct AnsibleCli<R> {
    runner: R,
    binary: String,
}

impl<R: CommandRunner> AnsibleCli<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            binary: "ansible".to_string(),
        }
    }

    /// Runs one ad-hoc module and returns ansible's exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory does not exist or `ansible` cannot
    /// be spawned.
    pub async fn run_module(
        &self,
        pattern: &str,
        inventory: &Path,
        module: &str,
        args: Option<&str>,
    ) -> Result<ExitStatus> {
        if !inventory.exists() {
            anyhow::bail!(
                "inventory {} not found; run `berth setup` or `berth inventory` first",
                inventory.display()
            );
        }
        let inventory = inventory.to_string_lossy();
        let mut argv = vec![pattern, "-i", &inventory, "-m", module];
        if let Some(args) = args {
            argv.extend_from_slice(&["-a", args]);
        }
        debug!(pattern, module, "running ansible");
        self.runner
            .run_status(&self.binary, &argv)
            .await
            .with_context(|| format!("failed to run {}", self.binary))
    }
}

/// Host pattern for the given container names; every provisioned host when
/// none are named.
#[must_use]
pub fn host_pattern(names: &[String]) -> String {
    if names.is_empty() {
        ALL_GROUP.to_string()
    } else {
        names.join(",")
    }
}
