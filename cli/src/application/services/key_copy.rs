//! Application service — install the local public key in a target.

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::application::ports::RemoteExecutor;
use crate::domain::Target;
use crate::domain::profile::authorize_key_commands;

/// Append `public_key` to `user`'s `authorized_keys` inside `target`.
///
/// Idempotent: the key is only appended when not already present.
///
/// # Errors
///
/// Returns an error naming the first step that failed or could not run.
pub async fn authorize_key(
    executor: &impl RemoteExecutor,
    target: &Target,
    user: &str,
    public_key: &str,
) -> Result<()> {
    for command in authorize_key_commands(user, public_key) {
        debug!(container = %target.name, %command, "exec");
        let result = executor.exec(target, &command, false).await?;
        if !result.success() {
            let step = command.split_whitespace().next().unwrap_or_default();
            bail!(
                "key copy step `{step}` failed with exit code {}: {}",
                result.exit_code,
                result.text()
            );
        }
    }
    info!(container = %target.name, user, "public key authorized");
    Ok(())
}
