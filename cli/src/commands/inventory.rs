//! `berth inventory` — detect package managers and write the inventory
//! without touching the containers.

use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;

use crate::app::AppContext;
use crate::application::services::fleet;
use crate::application::services::setup::write_inventory;
use crate::commands::TargetArgs;
use crate::domain::InventorySettings;

/// Run the inventory command.
///
/// # Errors
///
/// Returns an error if the runtime is unreachable or the file cannot be
/// written.
pub async fn run(app: &AppContext, args: &TargetArgs) -> Result<ExitCode> {
    let config = app.config()?;
    let runtime = app.runtime(&config);
    let options = app.fleet_options(&config);

    let items = {
        let reporter = app.reporter("Detecting package managers");
        fleet::survey(
            &runtime,
            &runtime,
            &args.containers,
            options.pool,
            options.provision.probe_timeout,
            &reporter,
        )
        .await?
    };

    let hosts = fleet::survey_hosts(&items);
    let written = if hosts.is_empty() {
        None
    } else {
        let settings = InventorySettings {
            user: config.ssh.user.clone(),
            password: config.ssh.password.clone(),
            python_interpreter: config.inventory.python_interpreter.clone(),
        };
        Some(write_inventory(
            &app.inventory_writer(&config),
            hosts,
            &settings,
            Utc::now(),
        )?)
    };

    app.renderer().render_inventory(&items, written.as_ref())?;
    Ok(if written.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
