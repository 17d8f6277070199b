//! Package-manager detection tables and pure classifiers.
//!
//! The detection service walks these tables in order; everything here is
//! synchronous and free of I/O so the heuristics can be tested directly.

use berth_common::{DetectionStrategy, PackageManagerKind};

use PackageManagerKind::{Apk, Apt, Dnf, Pacman, Yum, Zypper};

// ── Results ──────────────────────────────────────────────────────────────────

/// What a single detection strategy concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The strategy identified a package manager.
    Found(PackageManagerKind),
    /// Every check ran and none matched.
    Empty,
    /// No match, and at least one check could not run at all.
    Inconclusive(Vec<String>),
}

impl StrategyOutcome {
    #[must_use]
    pub fn found(&self) -> Option<PackageManagerKind> {
        match self {
            Self::Found(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Final detection result for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub kind: PackageManagerKind,
    /// Strategy that produced `kind`; `None` when nothing matched.
    pub strategy: Option<DetectionStrategy>,
}

impl Detection {
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            kind: PackageManagerKind::Unknown,
            strategy: None,
        }
    }

    #[must_use]
    pub fn found(kind: PackageManagerKind, strategy: DetectionStrategy) -> Self {
        Self {
            kind,
            strategy: Some(strategy),
        }
    }
}

// ── Strategy 1: direct probe ─────────────────────────────────────────────────

/// Binary invoked with `--version` for each manager, in probe order.
pub const DIRECT_PROBES: [(PackageManagerKind, &str); 6] = [
    (Apk, "apk"),
    (Apt, "apt-get"),
    (Yum, "yum"),
    (Dnf, "dnf"),
    (Zypper, "zypper"),
    (Pacman, "pacman"),
];

#[must_use]
pub fn probe_command(binary: &str) -> String {
    format!("{binary} --version 2>/dev/null")
}

// ── Strategy 2: release files ────────────────────────────────────────────────

pub const RELEASE_FILES: [&str; 6] = [
    "/etc/os-release",
    "/etc/lsb-release",
    "/etc/redhat-release",
    "/etc/debian_version",
    "/etc/alpine-release",
    "/etc/centos-release",
];

const RELEASE_KEYWORDS: [(&[&str], PackageManagerKind); 6] = [
    (&["alpine"], Apk),
    (&["ubuntu", "debian"], Apt),
    (&["centos", "rhel", "red hat"], Yum),
    (&["fedora"], Dnf),
    (&["suse", "opensuse"], Zypper),
    (&["arch"], Pacman),
];

/// Files whose name alone identifies the distribution family.
const RELEASE_PATH_HINTS: [(&str, PackageManagerKind); 2] =
    [("alpine-release", Apk), ("debian_version", Apt)];

#[must_use]
pub fn read_file_command(path: &str) -> String {
    format!("cat {path} 2>/dev/null")
}

/// Classify the contents of a release file.
///
/// Keywords are matched case-insensitively in table order. When the content
/// carries no keyword (e.g. `/etc/debian_version` holds only `12.5`) the file
/// name is used as a hint. Blank content never matches.
#[must_use]
pub fn classify_release(path: &str, content: &str) -> Option<PackageManagerKind> {
    if content.trim().is_empty() {
        return None;
    }
    let lower = content.to_lowercase();
    RELEASE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, kind)| *kind)
        .or_else(|| {
            RELEASE_PATH_HINTS
                .iter()
                .find(|(hint, _)| path.ends_with(hint))
                .map(|(_, kind)| *kind)
        })
}

// ── Strategy 3: image reference ──────────────────────────────────────────────

const IMAGE_PATTERNS: [(&[&str], PackageManagerKind); 6] = [
    (&["alpine", "busybox"], Apk),
    (&["ubuntu", "debian"], Apt),
    (&["centos", "rhel", "rockylinux", "oraclelinux"], Yum),
    (&["fedora"], Dnf),
    (&["opensuse", "suse"], Zypper),
    (&["archlinux"], Pacman),
];

/// Infer a package manager from the image reference by substring match.
#[must_use]
pub fn classify_image(image: &str) -> Option<PackageManagerKind> {
    let lower = image.to_lowercase();
    IMAGE_PATTERNS
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| lower.contains(p)))
        .map(|(_, kind)| *kind)
}

// ── Strategy 4: filesystem markers ───────────────────────────────────────────

/// Config paths first, then state directories.
pub const FILESYSTEM_MARKERS: [(PackageManagerKind, &str); 9] = [
    (Apk, "/etc/apk/repositories"),
    (Apt, "/etc/apt/sources.list"),
    (Yum, "/etc/yum.repos.d/"),
    (Dnf, "/etc/dnf/dnf.conf"),
    (Zypper, "/etc/zypp/"),
    (Apk, "/lib/apk/"),
    (Apt, "/var/lib/apt/"),
    (Yum, "/var/lib/yum/"),
    (Dnf, "/var/lib/dnf/"),
];

#[must_use]
pub fn path_exists_command(path: &str) -> String {
    format!("test -e {path}")
}
