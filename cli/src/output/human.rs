//! Human-readable terminal renderer.

use std::path::Path;

use berth_common::{TargetReport, TargetResult, VerificationStatus};
use owo_colors::OwoColorize as _;

use crate::application::services::fleet::{FleetItem, ItemResult};
use crate::application::services::provision::StageEvent;
use crate::application::services::setup::{InventoryWritten, KeyCopy, SetupResult};
use crate::domain::{BerthConfig, Detection};
use crate::domain::config::VALID_CONFIG_KEYS;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a crate::output::OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a crate::output::OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("berth {version}");
    }

    /// Render per-target trails, the summary table, key copy and inventory.
    pub fn render_setup(&self, result: &SetupResult) {
        if self.ctx.quiet {
            return;
        }
        for (name, trail) in &result.run.trails {
            self.render_trail(name, trail);
        }

        println!();
        self.ctx.header("Summary:");
        for target in &result.report().targets {
            self.render_target_line(target);
        }

        let report = result.report();
        println!();
        let line = format!(
            "{}/{} containers ready for SSH",
            report.success_count(),
            report.targets.len()
        );
        if report.any_success() {
            self.ctx.success(&line);
        } else {
            self.ctx.warn(&line);
        }

        match &result.key_copy {
            KeyCopy::Skipped => {}
            KeyCopy::Failed(reason) => self.ctx.warn(&format!("Key copy skipped: {reason}")),
            KeyCopy::Done(items) => {
                let copied = items
                    .iter()
                    .filter(|i| matches!(i.result, ItemResult::Done(Ok(()))))
                    .count();
                self.ctx
                    .info(&format!("Public key installed in {copied}/{} containers", items.len()));
            }
        }

        match &result.inventory {
            Some(written) => self.render_written(written),
            None => self.ctx.warn("No inventory written: no container is reachable over SSH"),
        }
        println!();
    }

    fn render_trail(&self, name: &str, trail: &[StageEvent]) {
        println!();
        println!("  {}", name.style(self.ctx.styles.bold));
        for event in trail {
            let marker = if event.ok {
                "✓".style(self.ctx.styles.success).to_string()
            } else {
                "⚠".style(self.ctx.styles.warning).to_string()
            };
            println!(
                "    {marker} {:<8} {}",
                event.stage.to_string().style(self.ctx.styles.dim),
                event.message
            );
        }
    }

    fn render_target_line(&self, target: &TargetReport) {
        let status = target_status(target);
        let status = if target.is_success() {
            status.style(self.ctx.styles.success).to_string()
        } else {
            status.style(self.ctx.styles.error).to_string()
        };
        println!(
            "    {:<24} {:<8} {:<16} {status}",
            target.name,
            target.package_manager.to_string(),
            target.address.as_deref().unwrap_or("-"),
        );
    }

    fn render_written(&self, written: &InventoryWritten) {
        self.ctx.success(&format!(
            "Inventory written to {} ({} hosts)",
            written.path.display(),
            written.hosts
        ));
    }

    /// Render a detection survey as a table.
    pub fn render_survey(&self, items: &[FleetItem<Detection>]) {
        if items.is_empty() {
            if !self.ctx.quiet {
                println!("No running containers found.");
            }
            return;
        }
        println!(
            "{:<24} {:<28} {:<16} {:<8} {}",
            "NAME", "IMAGE", "ADDRESS", "PKG", "STATUS"
        );
        for item in items {
            let (image, address, status) = match &item.target {
                Some(t) => (
                    t.image.as_str(),
                    t.resolve_address().unwrap_or("-"),
                    t.status.as_str(),
                ),
                None => ("-", "-", "not found"),
            };
            let pkg = match &item.result {
                ItemResult::Done(detection) => detection.kind.to_string(),
                ItemResult::NotFound(_) => "-".to_string(),
                ItemResult::TimedOut(_) => "timeout".to_string(),
            };
            println!(
                "{:<24} {:<28} {:<16} {:<8} {status}",
                item.name,
                truncate(image, 28),
                address,
                pkg.style(self.ctx.styles.package_manager),
            );
        }
    }

    /// Render connectivity check results.
    pub fn render_verify(&self, items: &[FleetItem<VerificationStatus>]) {
        if self.ctx.quiet {
            return;
        }
        println!();
        for item in items {
            match &item.result {
                ItemResult::Done(VerificationStatus::Passed { canary }) => {
                    self.ctx.success(&format!("{}: {canary}", item.name));
                }
                ItemResult::Done(status) => {
                    self.ctx
                        .warn(&format!("{}: {}", item.name, verification_display(status)));
                }
                ItemResult::NotFound(reason) => self.ctx.warn(&format!("{}: {reason}", item.name)),
                ItemResult::TimedOut(after) => self.ctx.warn(&format!(
                    "{}: timed out after {}s",
                    item.name,
                    after.as_secs()
                )),
            }
        }
        println!();
    }

    /// Render key copy results.
    pub fn render_key_copy(&self, items: &[FleetItem<std::result::Result<(), String>>]) {
        if self.ctx.quiet {
            return;
        }
        println!();
        for item in items {
            match &item.result {
                ItemResult::Done(Ok(())) => self.ctx.success(&format!("{}: key installed", item.name)),
                ItemResult::Done(Err(reason)) | ItemResult::NotFound(reason) => {
                    self.ctx.warn(&format!("{}: {reason}", item.name));
                }
                ItemResult::TimedOut(after) => self.ctx.warn(&format!(
                    "{}: timed out after {}s",
                    item.name,
                    after.as_secs()
                )),
            }
        }
        println!();
    }

    /// Render the result of an inventory-only run.
    pub fn render_inventory(&self, items: &[FleetItem<Detection>], written: Option<&InventoryWritten>) {
        if self.ctx.quiet {
            return;
        }
        println!();
        match written {
            Some(written) => self.render_written(written),
            None => self.ctx.warn(&format!(
                "No inventory written: none of {} containers has an address",
                items.len()
            )),
        }
        println!();
    }

    /// Render the current berth configuration.
    pub fn render_config(&self, config: &BerthConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in VALID_CONFIG_KEYS {
            let value = match config.get(key) {
                Ok(value) if *key == "ssh.password" => mask(&value),
                Ok(value) if value.is_empty() => "(not set)".to_string(),
                Ok(value) => value,
                Err(_) => continue,
            };
            println!("  {:<32} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["BERTH_CONFIG", "NO_COLOR", "RUST_LOG"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}

// ── Display helpers (used by tests and output layer) ─────────────────────────

/// Status column for a report line.
#[must_use]
pub fn target_status(target: &TargetReport) -> String {
    match (&target.result, target.detailed_outcome()) {
        (TargetResult::NotFound { reason }, _) => format!("not found: {reason}"),
        (TargetResult::TimedOut { after_secs }, _) => format!("timed out after {after_secs}s"),
        (TargetResult::Completed { verification, .. }, Some(outcome)) => match verification {
            VerificationStatus::Passed { .. } => format!("{outcome}, login verified"),
            _ => format!("{outcome} ({})", verification_display(verification)),
        },
        (TargetResult::Completed { .. }, None) => String::new(),
    }
}

#[must_use]
pub fn verification_display(status: &VerificationStatus) -> String {
    match status {
        VerificationStatus::Passed { canary } => format!("verified: {canary}"),
        VerificationStatus::Failed { reason } => format!("login failed: {reason}"),
        VerificationStatus::Skipped { reason } => format!("not verified: {reason}"),
    }
}

/// Hide all but the length of a secret.
#[must_use]
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "(not set)".to_string()
    } else {
        "*".repeat(secret.chars().count().min(12))
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let head: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
