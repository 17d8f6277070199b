//! Unit tests for berth CLI
//!
//! These tests drive the library through its ports with in-memory fakes and
//! run fast without containers, daemons or network access.

mod fleet_run;
mod property_tests;
