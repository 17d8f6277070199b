//! Application service — SSH connectivity check with key fallback.

use berth_common::VerificationStatus;
use tracing::{debug, info};

use crate::application::ports::{ConnectivityVerifier, Credential};
use crate::application::services::provision::Credentials;
use crate::domain::VerifyError;

/// Log in to `address` with the password and run the canary command.
///
/// When the password is rejected and an identity file is configured, the
/// login is retried once with the key.
pub async fn verify_address(
    verifier: &impl ConnectivityVerifier,
    address: &str,
    credentials: &Credentials,
) -> VerificationStatus {
    let password = Credential::Password(credentials.password.clone());
    let result = match verifier
        .connect(address, credentials.port, &credentials.user, &password)
        .await
    {
        Err(VerifyError::Auth(reason)) => match &credentials.identity {
            Some(identity) => {
                debug!(address, %reason, "password rejected; retrying with key");
                verifier
                    .connect(
                        address,
                        credentials.port,
                        &credentials.user,
                        &Credential::Key(identity.clone()),
                    )
                    .await
            }
            None => Err(VerifyError::Auth(reason)),
        },
        other => other,
    };

    match result {
        Ok(canary) => {
            info!(address, "SSH connectivity verified");
            VerificationStatus::Passed { canary }
        }
        Err(e) => VerificationStatus::Failed {
            reason: e.to_string(),
        },
    }
}
