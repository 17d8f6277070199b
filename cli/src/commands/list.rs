//! `berth list` — containers with their detected package manager.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::fleet;
use crate::commands::TargetArgs;

/// Run the list command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the runtime is
/// unreachable.
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

    app.renderer().render_survey(&items)?;
    Ok(ExitCode::SUCCESS)
}
