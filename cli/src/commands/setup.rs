//! `berth setup` — provision SSH across the fleet and write the inventory.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::setup::{self, SetupOptions};
use crate::commands::TargetArgs;
use crate::domain::{BerthConfig, validate_username};

/// Arguments for the setup command.
#[derive(Args, Debug, Default)]
pub struct SetupArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// User to create inside each container (overrides `ssh.user`)
    #[arg(long)]
    pub user: Option<String>,

    /// Password for that user (overrides `ssh.password`)
    #[arg(long, env = "BERTH_SSH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// SSH port used for the login check (overrides `ssh.port`)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Do not install the local public key
    #[arg(long)]
    pub no_key_copy: bool,
}

/// Apply command-line overrides to the loaded configuration.
///
/// # Errors
///
/// Returns an error if the user name is not a valid login.
pub fn apply_overrides(config: &mut BerthConfig, args: &SetupArgs) -> Result<()> {
    if let Some(user) = &args.user {
        validate_username(user)?;
        config.ssh.user.clone_from(user);
    }
    if let Some(password) = &args.password {
        config.ssh.password.clone_from(password);
    }
    if let Some(port) = args.port {
        config.ssh.port = port;
    }
    Ok(())
}

/// Run the setup command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the runtime is
/// unreachable, or the inventory cannot be written.
pub async fn run(app: &AppContext, args: SetupArgs) -> Result<ExitCode> {
    let mut config = app.config()?;
    apply_overrides(&mut config, &args)?;

    let names = &args.targets.containers;
    if names.is_empty()
        && !app.confirm(
            &format!(
                "Install SSH and create user '{}' in every running container?",
                config.ssh.user
            ),
            true,
        )?
    {
        app.output.info("Aborted.");
        return Ok(ExitCode::SUCCESS);
    }

    let runtime = app.runtime(&config);
    let verifier = app.verifier(&config);
    let keys = app.key_store()?;
    let writer = app.inventory_writer(&config);
    let options = SetupOptions {
        fleet: app.fleet_options(&config),
        skip_key_copy: args.no_key_copy,
        python_interpreter: config.inventory.python_interpreter.clone(),
    };

    let result = {
        let reporter = app.reporter("Provisioning containers");
        setup::setup(
            &runtime, &runtime, &verifier, &keys, &writer, names, &options, &reporter,
        )
        .await?
    };

    app.renderer().render_setup(&result)?;

    if result.report().any_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
