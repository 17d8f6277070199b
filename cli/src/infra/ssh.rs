//! SSH infrastructure: the `russh` connectivity verifier and the local key
//! store.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use tracing::debug;

use crate::application::ports::{CommandRunner, ConnectivityVerifier, Credential, KeyStore};
use crate::domain::VerifyError;
use crate::domain::profile::CANARY_COMMAND;

// ── Connectivity verifier ─────────────────────────────────────────────────────

/// Client handler that accepts any host key.
///
/// Containers regenerate host keys on every provisioning pass, so there is
/// nothing stable to pin against.
struct AcceptAnyHostKey;

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(fingerprint = %server_public_key.fingerprint(), "accepting host key");
        Ok(true)
    }
}

/// `ConnectivityVerifier` backed by an in-process `russh` client.
pub struct RusshVerifier {
    connect_timeout: Duration,
}

impl RusshVerifier {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    async fn open(
        &self,
        address: &str,
        port: u16,
        username: &str,
        credential: &Credential,
    ) -> Result<client::Handle<AcceptAnyHostKey>, VerifyError> {
        let config = Arc::new(client::Config::default());
        let mut session = client::connect(config, (address, port), AcceptAnyHostKey)
            .await
            .map_err(|e| VerifyError::Connect(format!("{address}:{port}: {e}")))?;

        let accepted = match credential {
            Credential::Password(password) => session
                .authenticate_password(username, password)
                .await
                .map_err(|e| VerifyError::Session(e.to_string()))?,
            Credential::Key(path) => {
                let key = russh_keys::load_secret_key(path, None).map_err(|e| {
                    VerifyError::Session(format!("cannot load {}: {e}", path.display()))
                })?;
                session
                    .authenticate_publickey(username, Arc::new(key))
                    .await
                    .map_err(|e| VerifyError::Session(e.to_string()))?
            }
        };
        if !accepted {
            return Err(VerifyError::Auth(username.to_string()));
        }
        Ok(session)
    }
}

impl ConnectivityVerifier for RusshVerifier {
    async fn connect(
        &self,
        address: &str,
        port: u16,
        username: &str,
        credential: &Credential,
    ) -> Result<String, VerifyError> {
        debug!(address, port, username, "opening SSH session");
        let limit = self.connect_timeout;
        let session = within(limit, self.open(address, port, username, credential), || {
            VerifyError::Connect(format!(
                "{address}:{port}: timed out after {}s",
                limit.as_secs()
            ))
        })
        .await?;

        let canary = within(limit, run_canary(&session), || {
            VerifyError::Session(format!(
                "canary command did not finish within {}s",
                limit.as_secs()
            ))
        })
        .await;
        let _ = session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await;
        canary
    }
}

/// Bound one phase of the exchange; `elapsed` builds the error when `limit`
/// runs out first.
async fn within<T>(
    limit: Duration,
    phase: impl Future<Output = Result<T, VerifyError>>,
    elapsed: impl FnOnce() -> VerifyError,
) -> Result<T, VerifyError> {
    tokio::time::timeout(limit, phase)
        .await
        .unwrap_or_else(|_| Err(elapsed()))
}

async fn run_canary(session: &client::Handle<AcceptAnyHostKey>) -> Result<String, VerifyError> {
    let mut channel = session
        .channel_open_session()
        .await
        .map_err(|e| VerifyError::Session(e.to_string()))?;
    channel
        .exec(true, CANARY_COMMAND)
        .await
        .map_err(|e| VerifyError::Session(e.to_string()))?;

    let mut output = Vec::new();
    let mut exit_status = None;
    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => output.extend_from_slice(data),
            ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
            _ => {}
        }
    }

    match exit_status {
        Some(0) => Ok(String::from_utf8_lossy(&output).trim().to_string()),
        Some(code) => Err(VerifyError::Session(format!(
            "canary command exited with {code}"
        ))),
        None => Err(VerifyError::Session(
            "channel closed without exit status".to_string(),
        )),
    }
}

// ── Local key store ───────────────────────────────────────────────────────────

/// Ed25519 key pair under `~/.berth/keys`, generated with `ssh-keygen`.
pub struct LocalKeyStore<R> {
    runner: R,
    path: PathBuf,
}

impl<R: CommandRunner> LocalKeyStore<R> {
    /// Creates a store for `~/.berth/keys/id_ed25519`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new(runner: R) -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(
            runner,
            home.join(".berth").join("keys").join("id_ed25519"),
        ))
    }

    /// Creates a store for an arbitrary private key path.
    #[must_use]
    pub fn with_path(runner: R, path: PathBuf) -> Self {
        Self { runner, path }
    }

    fn public_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".pub");
        PathBuf::from(name)
    }
}

impl<R: CommandRunner> KeyStore for LocalKeyStore<R> {
    async fn ensure_key_pair(&self) -> Result<String> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("create dir {}", parent.display()))?;
                set_permissions(parent, 0o700)?;
            }
            let path = self.path.to_string_lossy();
            debug!(path = %path, "generating SSH key pair");
            let output = self
                .runner
                .run(
                    "ssh-keygen",
                    &["-t", "ed25519", "-N", "", "-q", "-C", "berth", "-f", &path],
                )
                .await?;
            if !output.status.success() {
                anyhow::bail!(
                    "ssh-keygen failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
        }
        let public = self.public_path();
        let key = tokio::fs::read_to_string(&public)
            .await
            .with_context(|| format!("read {}", public.display()))?;
        Ok(key.trim().to_string())
    }

    fn identity_path(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
