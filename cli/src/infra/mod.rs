//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! container runtime CLI, the SSH client, key generation, and file
//! persistence.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod ansible;
pub mod command_runner;
pub mod config;
pub mod docker;
pub mod inventory;
pub mod ssh;
