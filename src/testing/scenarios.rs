//! Built-in scenarios
//!
//! `launch` taps a button and checks the reaction; `app-state` starts from a
//! clean install and inspects the foreground state.

use std::path::Path;

use crate::common::Result;

use super::config::{load_scenario, parse_scenario, TestScenario};

/// Scenario used by `smoke run` when none is named
pub const DEFAULT_SCENARIO: &str = "app-state";

const BUILTIN: &[(&str, &str)] = &[
    ("launch", include_str!("../../scenarios/launch.yaml")),
    ("app-state", include_str!("../../scenarios/app-state.yaml")),
];

/// Names of the built-in scenarios
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}

/// Look up a built-in scenario by name
pub fn builtin(name: &str) -> Option<Result<TestScenario>> {
    BUILTIN
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, yaml)| parse_scenario(yaml))
}

/// Resolve a built-in name or a path to a YAML file
pub fn resolve(name_or_path: &str) -> Result<TestScenario> {
    match builtin(name_or_path) {
        Some(scenario) => scenario,
        None => load_scenario(Path::new(name_or_path)),
    }
}
