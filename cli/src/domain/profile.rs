//! SSH install profiles and the fixed command tables of the provisioning
//! pipeline.
//!
//! Pure functions only — no I/O, no async.

use berth_common::PackageManagerKind;

/// Template for installing and launching an SSH server with one package manager.
#[derive(Debug)]
pub struct InstallProfile {
    pub kind: PackageManagerKind,
    pub packages: &'static [&'static str],
    /// Install command with a `{packages}` placeholder.
    pub install_template: &'static str,
    /// Best-effort follow-ups; individual failures are tolerated.
    pub post_install: &'static [&'static str],
    /// Foreground daemon command, used for the detached last-resort launch.
    pub service_command: &'static str,
}

impl InstallProfile {
    /// The install command with the package list substituted.
    #[must_use]
    pub fn install_command(&self) -> String {
        self.install_template
            .replace("{packages}", &self.packages.join(" "))
    }
}

static PROFILES: [InstallProfile; 5] = [
    InstallProfile {
        kind: PackageManagerKind::Apk,
        packages: &["openssh-server", "openssh-client", "sudo", "bash", "python3"],
        install_template: "apk add --no-cache {packages}",
        post_install: &["rc-update add sshd", "ssh-keygen -A", "mkdir -p /var/run/sshd"],
        service_command: "/usr/sbin/sshd -D",
    },
    InstallProfile {
        kind: PackageManagerKind::Apt,
        packages: &["openssh-server", "openssh-client", "sudo", "python3"],
        install_template: "apt-get update && DEBIAN_FRONTEND=noninteractive apt-get install -y {packages}",
        post_install: &[
            "mkdir -p /var/run/sshd",
            "systemctl enable ssh 2>/dev/null || update-rc.d ssh enable 2>/dev/null || true",
        ],
        service_command: "service ssh start && /usr/sbin/sshd -D",
    },
    InstallProfile {
        kind: PackageManagerKind::Yum,
        packages: &["openssh-server", "openssh-clients", "sudo", "python3"],
        install_template: "yum install -y {packages}",
        post_install: &["systemctl enable sshd 2>/dev/null || true", "ssh-keygen -A"],
        service_command: "/usr/sbin/sshd -D",
    },
    InstallProfile {
        kind: PackageManagerKind::Dnf,
        packages: &["openssh-server", "openssh-clients", "sudo", "python3"],
        install_template: "dnf install -y {packages}",
        post_install: &["systemctl enable sshd 2>/dev/null || true", "ssh-keygen -A"],
        service_command: "/usr/sbin/sshd -D",
    },
    InstallProfile {
        kind: PackageManagerKind::Zypper,
        packages: &["openssh", "sudo", "python3"],
        install_template: "zypper install -y {packages}",
        post_install: &["systemctl enable sshd 2>/dev/null || true", "ssh-keygen -A"],
        service_command: "/usr/sbin/sshd -D",
    },
];

/// Install profile for `kind`. `Pacman` and `Unknown` have none.
#[must_use]
pub fn profile_for(kind: PackageManagerKind) -> Option<&'static InstallProfile> {
    PROFILES.iter().find(|p| p.kind == kind)
}

// ── Pipeline command tables ──────────────────────────────────────────────────

/// Exits 0 with output when an SSH daemon process exists.
pub const SSHD_RUNNING_PROBE: &str = "pgrep sshd || ps aux | grep sshd | grep -v grep";

/// One-shot installers tried in order when no profile applies.
pub const UNIVERSAL_INSTALLERS: [(PackageManagerKind, &str); 4] = [
    (
        PackageManagerKind::Apt,
        "apt-get update && apt-get install -y openssh-server sudo 2>/dev/null || true",
    ),
    (
        PackageManagerKind::Yum,
        "yum install -y openssh-server sudo 2>/dev/null || true",
    ),
    (
        PackageManagerKind::Apk,
        "apk add --no-cache openssh-server sudo 2>/dev/null || true",
    ),
    (
        PackageManagerKind::Dnf,
        "dnf install -y openssh-server sudo 2>/dev/null || true",
    ),
];

/// Host-key and runtime-dir setup after a universal install.
pub const UNIVERSAL_POST_INSTALL: [&str; 2] = ["ssh-keygen -A", "mkdir -p /var/run/sshd"];

/// Service start attempts across init systems, in order.
pub const SERVICE_START_COMMANDS: [&str; 5] = [
    "/usr/sbin/sshd",
    "service ssh start",
    "systemctl start sshd",
    "rc-service sshd start",
    "/etc/init.d/ssh start",
];

pub const DEFAULT_DAEMON_COMMAND: &str = "/usr/sbin/sshd -D";

pub const CANARY_COMMAND: &str = "echo 'SSH connection successful'";

// ── Shell command builders ───────────────────────────────────────────────────

/// Quote `value` for a POSIX shell as a single word.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Home directory assumed for `user` inside a container.
#[must_use]
pub fn home_dir(user: &str) -> String {
    if user == "root" {
        "/root".to_string()
    } else {
        format!("/home/{user}")
    }
}

/// Commands that idempotently create `user`, set its password, grant
/// passwordless sudo and prepare `~/.ssh` (mode 0700).
///
/// `user` must already be validated (see `domain::config::validate_username`).
#[must_use]
pub fn user_setup_commands(user: &str, password: &str) -> Vec<String> {
    let home = home_dir(user);
    let credentials = shell_quote(&format!("{user}:{password}"));
    let sudoers = shell_quote(&format!("{user} ALL=(ALL) NOPASSWD:ALL"));
    vec![
        format!(
            "id -u {user} >/dev/null 2>&1 || useradd -m -s /bin/bash {user} || adduser -D -s /bin/sh {user}"
        ),
        format!("printf '%s\\n' {credentials} | chpasswd"),
        format!("grep -qxF {sudoers} /etc/sudoers || echo {sudoers} >> /etc/sudoers"),
        format!("mkdir -p {home}/.ssh"),
        format!("chown -R {user}:{user} {home}/.ssh"),
        format!("chmod 700 {home}/.ssh"),
    ]
}

/// Commands appending `public_key` to `user`'s `authorized_keys` once.
#[must_use]
pub fn authorize_key_commands(user: &str, public_key: &str) -> Vec<String> {
    let home = home_dir(user);
    let auth_keys = format!("{home}/.ssh/authorized_keys");
    let key = shell_quote(public_key.trim());
    vec![
        format!("mkdir -p {home}/.ssh"),
        format!("touch {auth_keys} && (grep -qxF {key} {auth_keys} || echo {key} >> {auth_keys})"),
        format!("chmod 600 {auth_keys}"),
        format!("chown -R {user}:{user} {home}/.ssh"),
    ]
}
