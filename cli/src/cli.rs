//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// SSH bootstrap for running containers
#[derive(Parser)]
#[command(
    name = "berth",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log every container command to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install and start SSH in containers, then write the inventory
    Setup(commands::setup::SetupArgs),

    /// Show containers and their detected package manager
    List(commands::TargetArgs),

    /// Check SSH login on containers
    Verify(commands::TargetArgs),

    /// Write the inventory without provisioning
    Inventory(commands::TargetArgs),

    /// Install the local public key in containers
    KeyCopy(commands::TargetArgs),

    /// Run the ansible ping module against provisioned containers
    Ping(commands::TargetArgs),

    /// Run a shell command on provisioned containers through ansible
    Shell(commands::ansible::ShellArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            yes,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        });

        match command {
            Command::Setup(args) => commands::setup::run(&app, args).await,
            Command::List(args) => commands::list::run(&app, &args).await,
            Command::Verify(args) => commands::verify::run(&app, &args).await,
            Command::Inventory(args) => commands::inventory::run(&app, &args).await,
            Command::KeyCopy(args) => commands::key_copy::run(&app, &args).await,
            Command::Ping(args) => commands::ansible::ping(&app, &args).await,
            Command::Shell(args) => commands::ansible::shell(&app, &args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
