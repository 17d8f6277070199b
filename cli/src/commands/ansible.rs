//! `berth ping` / `berth shell` — ad-hoc ansible modules against the
//! generated inventory.

use std::path::Path;
use std::process::{ExitCode, ExitStatus};

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::TargetArgs;
use crate::infra::ansible::host_pattern;

/// Arguments for the shell command.
#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Command to run on every selected container
    pub command: String,

    #[command(flatten)]
    pub targets: TargetArgs,
}

/// Run the ansible `ping` module.
///
/// # Errors
///
/// Returns an error if the inventory is missing or ansible cannot be run.
pub async fn ping(app: &AppContext, args: &TargetArgs) -> Result<ExitCode> {
    run_module(app, args, "ping", None).await
}

/// Run a shell command through the ansible `shell` module.
///
/// # Errors
///
/// Returns an error if the inventory is missing or ansible cannot be run.
pub async fn shell(app: &AppContext, args: &ShellArgs) -> Result<ExitCode> {
    run_module(app, &args.targets, "shell", Some(&args.command)).await
}

async fn run_module(
    app: &AppContext,
    targets: &TargetArgs,
    module: &str,
    module_args: Option<&str>,
) -> Result<ExitCode> {
    let config = app.config()?;
    let pattern = host_pattern(&targets.containers);
    let status = app
        .ansible()
        .run_module(
            &pattern,
            Path::new(&config.inventory.path),
            module,
            module_args,
        )
        .await?;
    Ok(exit_code(status))
}

/// Pass ansible's exit status through; signals and out-of-range codes map to 1.
fn exit_code(status: ExitStatus) -> ExitCode {
    status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from)
}
