//! Ansible inventory rendering.
//!
//! Pure functions only — the file itself is written by
//! `infra::inventory::FileInventoryWriter`.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use berth_common::{FleetReport, InventoryHost, PackageManagerKind};
use chrono::{DateTime, Utc};

use crate::domain::profile::shell_quote;

/// Parent group containing every per-package-manager group.
pub const ALL_GROUP: &str = "all_docker";

/// Connection settings repeated on each host line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySettings {
    pub user: String,
    pub password: String,
    pub python_interpreter: String,
}

/// Hosts worth putting in an inventory: successful targets whose address
/// resolved.
#[must_use]
pub fn hosts_from_report(report: &FleetReport) -> Vec<InventoryHost> {
    report
        .targets
        .iter()
        .filter(|t| t.is_success())
        .filter_map(|t| {
            Some(InventoryHost {
                name: t.name.clone(),
                address: t.address.clone()?,
                container_id: t.container_id.clone()?,
                package_manager: t.package_manager,
            })
        })
        .collect()
}

/// Group hosts by package manager. A container listed more than once keeps
/// its first entry only.
#[must_use]
pub fn group_hosts(hosts: Vec<InventoryHost>) -> BTreeMap<PackageManagerKind, Vec<InventoryHost>> {
    let mut seen = HashSet::new();
    let mut groups: BTreeMap<PackageManagerKind, Vec<InventoryHost>> = BTreeMap::new();
    for host in hosts {
        if seen.insert(host.container_id.clone()) {
            groups.entry(host.package_manager).or_default().push(host);
        }
    }
    groups
}

#[must_use]
pub fn group_name(kind: PackageManagerKind) -> String {
    format!("docker_{kind}")
}

/// Render grouped hosts as an INI inventory.
#[must_use]
pub fn render_inventory(
    groups: &BTreeMap<PackageManagerKind, Vec<InventoryHost>>,
    settings: &InventorySettings,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str("# =========================================\n");
    out.push_str("# Auto-generated container inventory\n");
    let _ = writeln!(
        out,
        "# Generated by berth at {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push_str("# =========================================\n\n");

    for (kind, hosts) in groups {
        let _ = writeln!(out, "[{}]", group_name(*kind));
        for host in hosts {
            let _ = writeln!(
                out,
                "{} ansible_host={} ansible_user={} ansible_ssh_pass={} \
                 ansible_ssh_common_args='-o StrictHostKeyChecking=no' \
                 ansible_python_interpreter={} container_id={} package_manager={}",
                host.name,
                host.address,
                settings.user,
                shell_quote(&settings.password),
                settings.python_interpreter,
                host.container_id,
                host.package_manager,
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "[{ALL_GROUP}:children]");
    for kind in groups.keys() {
        let _ = writeln!(out, "{}", group_name(*kind));
    }
    out.push('\n');

    let _ = writeln!(out, "[{ALL_GROUP}:vars]");
    out.push_str("ansible_connection=ssh\n");
    out.push_str(
        "ansible_ssh_common_args='-o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null'\n",
    );
    let _ = writeln!(out, "ansible_python_interpreter={}", settings.python_interpreter);
    out
}
