//! `berth verify` — SSH login check without provisioning.

use std::process::ExitCode;

use anyhow::Result;
use berth_common::VerificationStatus;

use crate::app::AppContext;
use crate::application::services::fleet::{self, ItemResult};
use crate::commands::TargetArgs;

/// Run the verify command. Exits non-zero when any login check failed.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the runtime is
/// unreachable.
pub async fn run(app: &AppContext, args: &TargetArgs) -> Result<ExitCode> {
    let config = app.config()?;
    let runtime = app.runtime(&config);
    let verifier = app.verifier(&config);
    let options = app.fleet_options(&config);

    let items = {
        let reporter = app.reporter("Checking SSH logins");
        fleet::verify(
            &runtime,
            &verifier,
            &args.containers,
            &options.credentials,
            options.pool,
            &reporter,
        )
        .await?
    };

    app.renderer().render_verify(&items)?;

    let all_passed = items
        .iter()
        .all(|item| matches!(item.result, ItemResult::Done(VerificationStatus::Passed { .. })));
    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
