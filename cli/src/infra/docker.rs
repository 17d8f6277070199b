//! Docker CLI adapter: implements `ContainerRuntime` and `RemoteExecutor`.
//!
//! Every call shells out to the configured runtime binary (`docker`, or a
//! CLI-compatible replacement such as `podman`) through a `CommandRunner`,
//! so timeouts and kill-on-expiry are inherited from the runner.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::{CommandResult, CommandRunner, ContainerRuntime, RemoteExecutor};
use crate::domain::Target;
use crate::domain::target::parse_inspect;

/// Runtime adapter over a Docker-compatible CLI.
pub struct DockerCli<R> {
    runner: R,
    binary: String,
    exec_timeout: Duration,
}

impl<R: CommandRunner> DockerCli<R> {
    #[must_use]
    pub fn new(runner: R, binary: impl Into<String>, exec_timeout: Duration) -> Self {
        Self {
            runner,
            binary: binary.into(),
            exec_timeout,
        }
    }

    async fn inspect(&self, refs: &[&str]) -> Result<std::process::Output> {
        let mut args = vec!["inspect", "--type", "container"];
        args.extend_from_slice(refs);
        self.runner.run(&self.binary, &args).await
    }
}

fn stderr_text(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl<R: CommandRunner> ContainerRuntime for DockerCli<R> {
    async fn ping(&self) -> Result<()> {
        let output = self
            .runner
            .run(&self.binary, &["version", "--format", "{{.Server.Version}}"])
            .await?;
        if !output.status.success() {
            anyhow::bail!("{} version: {}", self.binary, stderr_text(&output));
        }
        debug!(
            binary = %self.binary,
            server = %String::from_utf8_lossy(&output.stdout).trim(),
            "runtime reachable"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Target>> {
        let output = self
            .runner
            .run(&self.binary, &["ps", "--quiet", "--no-trunc"])
            .await?;
        if !output.status.success() {
            anyhow::bail!("{} ps: {}", self.binary, stderr_text(&output));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let ids: Vec<&str> = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let output = self.inspect(&ids).await?;
        if !output.status.success() {
            anyhow::bail!("{} inspect: {}", self.binary, stderr_text(&output));
        }
        let targets = parse_inspect(&output.stdout)?;
        Ok(targets.into_iter().filter(Target::is_running).collect())
    }

    async fn get(&self, name: &str) -> Result<Option<Target>> {
        let output = self.inspect(&[name]).await?;
        if !output.status.success() {
            let stderr = stderr_text(&output);
            if stderr.contains("No such") || stderr.contains("no such") {
                return Ok(None);
            }
            anyhow::bail!("{} inspect {name}: {stderr}", self.binary);
        }
        let mut targets =
            parse_inspect(&output.stdout).with_context(|| format!("inspecting {name}"))?;
        Ok(if targets.is_empty() {
            None
        } else {
            Some(targets.swap_remove(0))
        })
    }
}

impl<R: CommandRunner> RemoteExecutor for DockerCli<R> {
    async fn exec(&self, target: &Target, command: &str, detach: bool) -> Result<CommandResult> {
        self.exec_with_timeout(target, command, detach, self.exec_timeout)
            .await
    }

    async fn exec_with_timeout(
        &self,
        target: &Target,
        command: &str,
        detach: bool,
        timeout: Duration,
    ) -> Result<CommandResult> {
        let mut args = vec!["exec"];
        if detach {
            args.push("-d");
        }
        args.extend_from_slice(&[target.id.as_str(), "/bin/sh", "-c", command]);

        let output = self
            .runner
            .run_with_timeout(&self.binary, &args, timeout)
            .await
            .with_context(|| format!("exec in {}", target.name))?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            output: combined,
        })
    }
}
