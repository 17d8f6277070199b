//! Property-based tests for validation, quoting and detection heuristics.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use berth_cli::domain::config::VALID_CONFIG_KEYS;
use berth_cli::domain::package_manager::{classify_image, classify_release};
use berth_cli::domain::profile::{authorize_key_commands, shell_quote, user_setup_commands};
use berth_cli::domain::{
    BerthConfig, InventorySettings, group_hosts, render_inventory, validate_config_key,
    validate_config_value, validate_username,
};
use berth_common::{InventoryHost, PackageManagerKind};

// ============================================================================
// Configuration keys and values
// ============================================================================

proptest! {
    /// Keys outside the whitelist are rejected.
    #[test]
    fn prop_arbitrary_keys_rejected(key in "[a-z]{1,20}\\.[a-z_]{1,20}") {
        if !VALID_CONFIG_KEYS.contains(&key.as_str()) {
            prop_assert!(validate_config_key(&key).is_err(), "accepted invalid key: {key}");
        }
    }

    /// Every valid port round-trips through set/get.
    #[test]
    fn prop_valid_ports_round_trip(port in 1u16..) {
        let mut config = BerthConfig::default();
        config.set("ssh.port", &port.to_string()).expect("valid port");
        prop_assert_eq!(config.get("ssh.port").expect("known key"), port.to_string());
    }

    /// Ports outside 1..=65535 are rejected and leave the config untouched.
    #[test]
    fn prop_out_of_range_ports_rejected(port in 65_536u32..1_000_000) {
        let mut config = BerthConfig::default();
        prop_assert!(config.set("ssh.port", &port.to_string()).is_err());
        prop_assert_eq!(config.ssh.port, 22);
    }

    /// Concurrency above the cap is rejected.
    #[test]
    fn prop_concurrency_above_cap_rejected(n in 65usize..10_000) {
        prop_assert!(validate_config_value("fleet.concurrency", &n.to_string()).is_err());
    }

    /// Non-numeric timeouts are rejected.
    #[test]
    fn prop_non_numeric_timeouts_rejected(value in "[a-z]{1,10}") {
        prop_assert!(validate_config_value("timeouts.probe_secs", &value).is_err());
    }
}

#[test]
fn test_every_valid_key_is_readable() {
    let config = BerthConfig::default();
    for key in VALID_CONFIG_KEYS {
        assert!(config.get(key).is_ok(), "{key} not readable");
    }
}

// ============================================================================
// User names and shell quoting
// ============================================================================

proptest! {
    /// Portable lower-case names are accepted.
    #[test]
    fn prop_portable_usernames_accepted(name in "[a-z_][a-z0-9_-]{0,31}") {
        prop_assert!(validate_username(&name).is_ok(), "rejected {name}");
    }

    /// Names carrying shell metacharacters are rejected.
    #[test]
    fn prop_shell_metacharacters_rejected(
        prefix in "[a-z]{1,5}",
        meta in "[;&|$`' ()<>]",
        suffix in "[a-z]{0,5}",
    ) {
        let name = format!("{prefix}{meta}{suffix}");
        prop_assert!(validate_username(&name).is_err(), "accepted {name}");
    }

    /// A quoted value is one single-quoted word whose content unquotes back.
    #[test]
    fn prop_shell_quote_is_single_word(value in "\\PC{0,40}") {
        let quoted = shell_quote(&value);
        prop_assert!(quoted.starts_with('\''));
        prop_assert!(quoted.ends_with('\''));
        let unquoted = quoted[1..quoted.len() - 1].replace(r"'\''", "'");
        prop_assert_eq!(unquoted, value);
    }

    /// The password never appears unquoted in the user setup commands.
    #[test]
    fn prop_password_only_appears_quoted(password in "[a-zA-Z0-9 ;&|$'\"]{1,24}") {
        let commands = user_setup_commands("ansible", &password);
        let quoted = shell_quote(&format!("ansible:{password}"));
        prop_assert!(commands[1].contains(&quoted));
        prop_assert!(commands[1].ends_with("| chpasswd"));
    }

    /// Key installation is idempotent: the append is guarded by a grep.
    #[test]
    fn prop_authorize_key_guards_the_append(user in "[a-z][a-z0-9]{0,8}") {
        let commands = authorize_key_commands(&user, "ssh-ed25519 AAAA berth\n");
        prop_assert_eq!(commands.len(), 4);
        prop_assert!(commands[1].contains("grep -qxF"));
        prop_assert!(commands[1].contains("'ssh-ed25519 AAAA berth'"));
    }
}

// ============================================================================
// Detection heuristics
// ============================================================================

proptest! {
    /// Any image reference mentioning alpine classifies as apk.
    #[test]
    fn prop_alpine_images_are_apk(
        registry in "([a-z]{1,8}\\.[a-z]{2,3}/)?",
        tag in "(:[0-9]{1,2}\\.[0-9]{1,2})?",
    ) {
        let image = format!("{registry}alpine{tag}");
        prop_assert_eq!(classify_image(&image), Some(PackageManagerKind::Apk));
    }

    /// Blank release files never classify.
    #[test]
    fn prop_blank_release_file_is_unclassified(blank in "[ \t\n]{0,10}") {
        prop_assert_eq!(classify_release("/etc/os-release", &blank), None);
    }
}

// ============================================================================
// Inventory rendering
// ============================================================================

fn settings() -> InventorySettings {
    InventorySettings {
        user: "ansible".to_string(),
        password: "ansible123".to_string(),
        python_interpreter: "/usr/bin/python3".to_string(),
    }
}

fn kind_strategy() -> impl Strategy<Value = PackageManagerKind> {
    prop::sample::select(vec![
        PackageManagerKind::Apk,
        PackageManagerKind::Apt,
        PackageManagerKind::Yum,
        PackageManagerKind::Dnf,
        PackageManagerKind::Unknown,
    ])
}

proptest! {
    /// Each container appears exactly once, under the group of its manager.
    #[test]
    fn prop_inventory_lists_each_container_once(
        entries in prop::collection::vec(("[a-z]{3,8}", 0u8..6, kind_strategy()), 1..12),
    ) {
        let hosts: Vec<InventoryHost> = entries
            .iter()
            .map(|(name, id, kind)| InventoryHost {
                name: name.clone(),
                address: format!("172.17.0.{id}"),
                container_id: format!("c{id}"),
                package_manager: *kind,
            })
            .collect();
        let unique_ids: std::collections::HashSet<_> =
            hosts.iter().map(|h| h.container_id.clone()).collect();

        let groups = group_hosts(hosts);
        let grouped: usize = groups.values().map(Vec::len).sum();
        prop_assert_eq!(grouped, unique_ids.len());

        let when = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let text = render_inventory(&groups, &settings(), when);
        for id in &unique_ids {
            let needle = format!("container_id={id} ");
            prop_assert_eq!(text.matches(&needle).count(), 1);
        }
        for kind in groups.keys() {
            let group = format!("[docker_{kind}]");
            prop_assert!(text.contains(&group), "missing group {}", group);
        }
    }
}
