//! JSON output helpers.
//!
//! `JsonRenderer` prints one pretty-printed document per command on stdout;
//! `format_error` builds the error object used by all `--json` code paths
//! when a command fails.

use std::path::Path;

use anyhow::{Context, Result};
use berth_common::VerificationStatus;
use serde::Serialize;
use serde_json::{Value, json};

use crate::application::services::fleet::{FleetItem, ItemResult};
use crate::application::services::setup::{InventoryWritten, KeyCopy, SetupResult};
use crate::domain::{BerthConfig, Detection};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Renders command results as JSON on stdout.
pub struct JsonRenderer;

fn print(value: &impl Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// One item of a fleet operation; `detail` is the operation's own payload.
fn item_json<T>(item: &FleetItem<T>, detail: impl FnOnce(&T) -> Value) -> Value {
    let mut obj = json!({
        "name": item.name,
        "container_id": item.target.as_ref().map(|t| t.id.clone()),
        "image": item.target.as_ref().map(|t| t.image.clone()),
        "address": item.target.as_ref().and_then(|t| t.resolve_address().map(str::to_string)),
    });
    let status = match &item.result {
        ItemResult::Done(value) => {
            if let (Value::Object(map), Value::Object(extra)) = (&mut obj, detail(value)) {
                map.extend(extra);
            }
            json!("done")
        }
        ItemResult::NotFound(reason) => {
            obj["reason"] = json!(reason);
            json!("not_found")
        }
        ItemResult::TimedOut(after) => {
            obj["after_secs"] = json!(after.as_secs());
            json!("timed_out")
        }
    };
    obj["status"] = status;
    obj
}

fn detection_json(detection: &Detection) -> Value {
    json!({
        "package_manager": detection.kind,
        "detected_by": detection.strategy,
    })
}

fn key_copy_json(result: &std::result::Result<(), String>) -> Value {
    match result {
        Ok(()) => json!({ "key_installed": true }),
        Err(reason) => json!({ "key_installed": false, "reason": reason }),
    }
}

fn written_json(written: Option<&InventoryWritten>) -> Value {
    written.map_or(Value::Null, |w| {
        json!({ "path": w.path, "hosts": w.hosts })
    })
}

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_setup(&self, result: &SetupResult) -> Result<()> {
        let key_copy = match &result.key_copy {
            KeyCopy::Skipped => Value::Null,
            KeyCopy::Failed(reason) => json!({ "error": reason }),
            KeyCopy::Done(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item_json(item, key_copy_json))
                    .collect(),
            ),
        };
        print(&json!({
            "report": result.report(),
            "success_count": result.report().success_count(),
            "key_copy": key_copy,
            "inventory": written_json(result.inventory.as_ref()),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_survey(&self, items: &[FleetItem<Detection>]) -> Result<()> {
        let targets: Vec<Value> = items
            .iter()
            .map(|item| item_json(item, detection_json))
            .collect();
        print(&json!({ "targets": targets }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_verify(&self, items: &[FleetItem<VerificationStatus>]) -> Result<()> {
        let targets: Vec<Value> = items
            .iter()
            .map(|item| {
                item_json(item, |status| {
                    json!({ "verification": status })
                })
            })
            .collect();
        print(&json!({ "targets": targets }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_key_copy(&self, items: &[FleetItem<std::result::Result<(), String>>]) -> Result<()> {
        let targets: Vec<Value> = items
            .iter()
            .map(|item| item_json(item, key_copy_json))
            .collect();
        print(&json!({ "targets": targets }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_inventory(
        &self,
        items: &[FleetItem<Detection>],
        written: Option<&InventoryWritten>,
    ) -> Result<()> {
        let targets: Vec<Value> = items
            .iter()
            .map(|item| item_json(item, detection_json))
            .collect();
        print(&json!({
            "targets": targets,
            "inventory": written_json(written),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &BerthConfig, path: &Path) -> Result<()> {
        let mut config = config.clone();
        if !config.ssh.password.is_empty() {
            config.ssh.password = "********".to_string();
        }
        print(&json!({ "path": path, "config": config }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }
}
