//! Smoke test runner
//!
//! Reads YAML scenarios (or one of the built-ins) and runs them against the
//! automation server, one session per scenario.

mod config;
mod runner;
pub mod scenarios;

pub use config::*;
pub use runner::{run_scenario, run_scenario_until, RunOptions, TestResult, FINAL_SOURCE_FILE};
