//! Command implementations

pub mod ansible;
pub mod config;
pub mod inventory;
pub mod key_copy;
pub mod list;
pub mod setup;
pub mod verify;
pub mod version;

use clap::Args;

/// Container selection shared by the fleet commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Container names or ids (default: every running container)
    #[arg(short, long = "containers", value_name = "NAME", num_args = 1..)]
    pub containers: Vec<String>,
}
