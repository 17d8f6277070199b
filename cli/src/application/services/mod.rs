//! Application services — use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports` — never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod config_service;
pub mod connectivity;
pub mod detect;
pub mod fleet;
pub mod key_copy;
pub mod provision;
pub mod setup;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub mod test_support;
