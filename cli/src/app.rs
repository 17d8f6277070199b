//! Application context — unified state passed to every command handler.
//!
//! `AppContext` owns the output context and the configuration store, and
//! builds the infrastructure adapters a command needs from the loaded
//! configuration. Adding a new cross-cutting concern requires only one field
//! change here — zero command signatures change.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::KeyStore;
use crate::application::services::config_service;
use crate::application::services::fleet::FleetOptions;
use crate::domain::BerthConfig;
use crate::infra::ansible::AnsibleCli;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::docker::DockerCli;
use crate::infra::inventory::FileInventoryWriter;
use crate::infra::ssh::{LocalKeyStore, RusshVerifier};
use crate::output::reporter::TerminalReporter;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `BERTH_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration persistence.
    pub config_store: YamlConfigStore,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `BERTH_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("BERTH_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            config_store: YamlConfigStore,
            non_interactive,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for a fleet operation; silent under `--json`.
    #[must_use]
    pub fn reporter(&self, message: &str) -> TerminalReporter<'_> {
        if self.is_json() {
            TerminalReporter::muted(&self.output)
        } else {
            TerminalReporter::with_spinner(&self.output, message)
        }
    }

    /// Load the configuration file, or defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn config(&self) -> Result<BerthConfig> {
        config_service::load_config(&self.config_store)
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `BERTH_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    // ── Adapters ────────────────────────────────────────────────────────────

    /// Runtime client for the configured binary.
    #[must_use]
    pub fn runtime(&self, config: &BerthConfig) -> DockerCli<TokioCommandRunner> {
        DockerCli::new(
            TokioCommandRunner::default(),
            config.runtime.binary.clone(),
            config.timeouts.exec(),
        )
    }

    /// SSH connectivity verifier.
    #[must_use]
    pub fn verifier(&self, config: &BerthConfig) -> RusshVerifier {
        RusshVerifier::new(config.timeouts.connect())
    }

    /// Local key pair store.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn key_store(&self) -> Result<LocalKeyStore<TokioCommandRunner>> {
        LocalKeyStore::new(TokioCommandRunner::default())
    }

    /// Inventory file writer for the configured path.
    #[must_use]
    pub fn inventory_writer(&self, config: &BerthConfig) -> FileInventoryWriter {
        FileInventoryWriter::new(&config.inventory.path)
    }

    /// Ansible ad-hoc command runner.
    #[must_use]
    pub fn ansible(&self) -> AnsibleCli<TokioCommandRunner> {
        AnsibleCli::new(TokioCommandRunner::default())
    }

    /// Fleet options from configuration.
    ///
    /// The key fallback during verification uses `ssh.identity` when set,
    /// otherwise the berth key pair once it exists.
    #[must_use]
    pub fn fleet_options(&self, config: &BerthConfig) -> FleetOptions {
        let identity = config
            .ssh
            .identity
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| {
                self.key_store()
                    .ok()
                    .map(|store| store.identity_path())
                    .filter(|path| path.exists())
            });
        FleetOptions::from_config(config, identity)
    }
}
