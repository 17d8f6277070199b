use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// System package manager inferred to be present inside a container image.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerKind {
    Apk,
    Apt,
    Yum,
    Dnf,
    Zypper,
    Pacman,
    #[default]
    Unknown,
}

impl PackageManagerKind {
    /// Every known manager, in direct-probe priority order (excludes `Unknown`).
    pub const KNOWN: [PackageManagerKind; 6] = [
        PackageManagerKind::Apk,
        PackageManagerKind::Apt,
        PackageManagerKind::Yum,
        PackageManagerKind::Dnf,
        PackageManagerKind::Zypper,
        PackageManagerKind::Pacman,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Apt => "apt",
            Self::Yum => "yum",
            Self::Dnf => "dnf",
            Self::Zypper => "zypper",
            Self::Pacman => "pacman",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a package manager.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown package manager '{0}' (expected one of: apk, apt, yum, dnf, zypper, pacman, unknown)")]
pub struct ParseKindError(pub String);

impl FromStr for PackageManagerKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apk" => Ok(Self::Apk),
            "apt" | "apt-get" => Ok(Self::Apt),
            "yum" => Ok(Self::Yum),
            "dnf" => Ok(Self::Dnf),
            "zypper" => Ok(Self::Zypper),
            "pacman" => Ok(Self::Pacman),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Which detection strategy produced a package manager result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    DirectProbe,
    ReleaseFile,
    ImageName,
    Filesystem,
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DirectProbe => "direct probe",
            Self::ReleaseFile => "release file",
            Self::ImageName => "image name",
            Self::Filesystem => "filesystem",
        })
    }
}

/// Result of one provisioning pass for a container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    AlreadyRunning,
    InstallFailed,
    ServiceStartFailed,
    /// Only used in detailed reports; provisioning itself still succeeded.
    VerificationFailed,
}

impl OutcomeKind {
    /// `true` when the container ended up with a running SSH daemon.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Success | Self::AlreadyRunning | Self::VerificationFailed
        )
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::AlreadyRunning => "already running",
            Self::InstallFailed => "install failed",
            Self::ServiceStartFailed => "service start failed",
            Self::VerificationFailed => "verification failed",
        })
    }
}

/// Outcome of the post-provisioning SSH connectivity check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VerificationStatus {
    Passed { canary: String },
    Failed { reason: String },
    Skipped { reason: String },
}

impl VerificationStatus {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-target entry of a fleet report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetResult {
    /// The pipeline ran to a terminal state.
    Completed {
        outcome: OutcomeKind,
        verification: VerificationStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    /// The container could not be resolved by the runtime.
    NotFound { reason: String },
    /// The per-target deadline expired before the pipeline finished.
    TimedOut { after_secs: u64 },
}

/// One container's line in a [`FleetReport`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetReport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub package_manager: PackageManagerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_by: Option<DetectionStrategy>,
    pub result: TargetResult,
}

impl TargetReport {
    /// Record for a requested name the runtime could not resolve.
    #[must_use]
    pub fn not_found(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            container_id: None,
            image: None,
            address: None,
            package_manager: PackageManagerKind::Unknown,
            detected_by: None,
            result: TargetResult::NotFound {
                reason: reason.into(),
            },
        }
    }

    /// Outcome as shown in detailed reports: a failed connectivity check
    /// surfaces as `VerificationFailed` even though provisioning succeeded.
    #[must_use]
    pub fn detailed_outcome(&self) -> Option<OutcomeKind> {
        match &self.result {
            TargetResult::Completed {
                outcome: OutcomeKind::Success,
                verification,
                ..
            } if verification.is_failed() => Some(OutcomeKind::VerificationFailed),
            TargetResult::Completed { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.detailed_outcome().is_some_and(OutcomeKind::is_success)
    }
}

/// Aggregated result of one orchestration pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FleetReport {
    pub generated_at: DateTime<Utc>,
    pub targets: Vec<TargetReport>,
}

impl FleetReport {
    #[must_use]
    pub fn new(targets: Vec<TargetReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            targets,
        }
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_success()).count()
    }

    #[must_use]
    pub fn any_success(&self) -> bool {
        self.success_count() > 0
    }
}

/// A host entry handed to the inventory writer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryHost {
    pub name: String,
    pub address: String,
    pub container_id: String,
    pub package_manager: PackageManagerKind,
}
