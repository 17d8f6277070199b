//! Integration tests for berth CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them needs a container runtime.

mod cli_tests;
mod config_command;
mod runtime_errors;
