//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod inventory;
pub mod package_manager;
pub mod profile;
pub mod target;

#[allow(unused_imports)]
pub use config::{BerthConfig, validate_config_key, validate_config_value, validate_username};
#[allow(unused_imports)]
pub use error::{ConfigError, ProvisionError, VerifyError};
#[allow(unused_imports)]
pub use inventory::{InventorySettings, group_hosts, hosts_from_report, render_inventory};
#[allow(unused_imports)]
pub use package_manager::{Detection, StrategyOutcome};
#[allow(unused_imports)]
pub use profile::{InstallProfile, profile_for};
#[allow(unused_imports)]
pub use target::Target;
