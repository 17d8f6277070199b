//! `berth key-copy` — install the local public key in containers.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::fleet::{self, ItemResult};
use crate::commands::TargetArgs;

/// Run the key-copy command. Exits non-zero when any container was missed.
///
/// # Errors
///
/// Returns an error if the runtime is unreachable or the local key pair
/// cannot be created.
pub async fn run(app: &AppContext, args: &TargetArgs) -> Result<ExitCode> {
    let config = app.config()?;
    let runtime = app.runtime(&config);
    let keys = app.key_store()?;
    let options = app.fleet_options(&config);

    let items = {
        let reporter = app.reporter("Installing public key");
        fleet::copy_keys(
            &runtime,
            &runtime,
            &keys,
            &args.containers,
            &config.ssh.user,
            options.pool,
            &reporter,
        )
        .await?
    };

    app.renderer().render_key_copy(&items)?;

    let all_copied = items
        .iter()
        .all(|item| matches!(item.result, ItemResult::Done(Ok(()))));
    Ok(if all_copied {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
