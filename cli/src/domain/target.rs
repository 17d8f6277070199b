//! Container targets as seen by the provisioning core.
//!
//! Pure data plus the `docker inspect` JSON decoding used by the runtime
//! adapter. No I/O.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

/// An addressable container instance under management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Full container id.
    pub id: String,
    /// Container name without the leading `/`.
    pub name: String,
    /// Declared image reference, or the image id when the container has none.
    pub image: String,
    /// Runtime status, e.g. `running`.
    pub status: String,
    /// Primary network address; empty strings are normalised to `None`.
    pub address: Option<String>,
    /// Network attachments in network-name order: `(network name, address)`.
    pub networks: Vec<(String, Option<String>)>,
    pub labels: BTreeMap<String, String>,
}

impl Target {
    /// Resolve the address used for SSH: the primary address, else the
    /// address of the first network attachment.
    #[must_use]
    pub fn resolve_address(&self) -> Option<&str> {
        if let Some(addr) = self.address.as_deref() {
            return Some(addr);
        }
        self.networks.first().and_then(|(_, addr)| addr.as_deref())
    }

    /// First 12 characters of the container id, as printed by `docker ps`.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

// ── docker inspect decoding ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct InspectEntry {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Image", default)]
    image_id: String,
    #[serde(rename = "Config", default)]
    config: InspectConfig,
    #[serde(rename = "State", default)]
    state: InspectState,
    #[serde(rename = "NetworkSettings", default)]
    network: InspectNetwork,
}

#[derive(Deserialize, Default)]
struct InspectConfig {
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Labels", default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize, Default)]
struct InspectState {
    #[serde(rename = "Status", default)]
    status: String,
}

#[derive(Deserialize, Default)]
struct InspectNetwork {
    #[serde(rename = "IPAddress", default)]
    ip_address: Option<String>,
    #[serde(rename = "Networks", default)]
    networks: Option<BTreeMap<String, InspectAttachment>>,
}

#[derive(Deserialize, Default)]
struct InspectAttachment {
    #[serde(rename = "IPAddress", default)]
    ip_address: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<InspectEntry> for Target {
    fn from(entry: InspectEntry) -> Self {
        let image = if entry.config.image.is_empty() {
            entry.image_id
        } else {
            entry.config.image
        };
        let networks = entry
            .network
            .networks
            .unwrap_or_default()
            .into_iter()
            .map(|(name, att)| (name, non_empty(att.ip_address)))
            .collect();
        Self {
            id: entry.id,
            name: entry.name.trim_start_matches('/').to_string(),
            image,
            status: entry.state.status,
            address: non_empty(entry.network.ip_address),
            networks,
            labels: entry.config.labels.unwrap_or_default(),
        }
    }
}

/// Decode the JSON array printed by `docker inspect`.
///
/// # Errors
///
/// Returns an error if the payload is not a JSON array of container objects.
pub fn parse_inspect(json: &[u8]) -> Result<Vec<Target>> {
    let entries: Vec<InspectEntry> =
        serde_json::from_slice(json).context("parsing container inspect output")?;
    Ok(entries.into_iter().map(Target::from).collect())
}
