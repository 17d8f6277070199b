//! berth - SSH bootstrap for running containers

use std::process::ExitCode;

use berth_cli::cli::Cli;
use berth_cli::domain::{ConfigError, ProvisionError};
use berth_cli::output::json::format_error;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so stdout stays clean for `--json`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,berth_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<ProvisionError>() {
        return match e {
            ProvisionError::RuntimeUnavailable(_) => "runtime_unavailable",
            ProvisionError::TargetNotFound(_) => "target_not_found",
            _ => "provision_failed",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "invalid_config";
    }
    "error"
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json {
                match format_error(&format!("{e:#}"), error_code(&e)) {
                    Ok(body) => println!("{body}"),
                    Err(_) => eprintln!("Error: {e:#}"),
                }
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
