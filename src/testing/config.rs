//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::common::{Error, Result};
use crate::webdriver::Locator;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Capability overrides keyed by wire name (e.g. `fullReset`)
    #[serde(default)]
    pub capabilities: BTreeMap<String, Value>,
    /// The sequence of test steps to execute
    pub steps: Vec<TestStep>,
}

/// A single test step in the execution flow
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Wait before the next step (gives the app time to load)
    Wait {
        /// Duration in milliseconds
        ms: u64,
    },
    /// Query the foreground package
    CurrentPackage { expect: Option<TextExpectation> },
    /// Query the foreground activity
    CurrentActivity { expect: Option<TextExpectation> },
    /// Dump the UI hierarchy
    Source,
    /// Find all elements matching a locator
    FindElements {
        locator: Locator,
        expect: Option<CountExpectation>,
    },
    /// Find an element and click it
    Click { locator: Locator },
    /// Find an element and assert that it is displayed
    AssertDisplayed {
        locator: Locator,
        /// Failure message
        message: Option<String>,
    },
    /// Find an element and assert on its text
    AssertText {
        locator: Locator,
        expect: TextExpectation,
    },
}

impl TestStep {
    /// Short label used in progress output
    pub fn label(&self) -> String {
        match self {
            TestStep::Wait { ms } => format!("wait {}ms", ms),
            TestStep::CurrentPackage { .. } => "current package".to_string(),
            TestStep::CurrentActivity { .. } => "current activity".to_string(),
            TestStep::Source => "source".to_string(),
            TestStep::FindElements { locator, .. } => format!("find elements by {}", locator),
            TestStep::Click { locator } => format!("click {}", locator),
            TestStep::AssertDisplayed { locator, .. } => format!("assert displayed {}", locator),
            TestStep::AssertText { locator, .. } => format!("assert text of {}", locator),
        }
    }
}

/// Expectations for a text value
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TextExpectation {
    /// Value must not be empty
    pub non_empty: Option<bool>,
    /// Expected exact value
    pub equals: Option<String>,
    /// Expected substring
    pub contains: Option<String>,
    /// Failure message
    pub message: Option<String>,
}

impl TextExpectation {
    /// Check a value, naming it `what` in the failure
    pub fn check(&self, what: &str, actual: &str) -> Result<()> {
        let fail = |detail: String| {
            let text = match &self.message {
                Some(message) => format!("{} ({})", message, detail),
                None => detail,
            };
            Err(Error::Assertion(text))
        };

        if self.non_empty == Some(true) && actual.trim().is_empty() {
            return fail(format!("{} is empty", what));
        }

        if let Some(expected) = &self.equals {
            if actual != expected {
                return fail(format!("{}: expected '{}', got '{}'", what, expected, actual));
            }
        }

        if let Some(expected) = &self.contains {
            if !actual.contains(expected.as_str()) {
                return fail(format!(
                    "{}: expected value containing '{}', got '{}'",
                    what, expected, actual
                ));
            }
        }

        Ok(())
    }
}

/// Expectations for the number of matched elements
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CountExpectation {
    /// Minimum number of matches
    pub min_count: Option<usize>,
    /// Exact number of matches
    pub count: Option<usize>,
    /// Failure message
    pub message: Option<String>,
}

impl CountExpectation {
    pub fn check(&self, locator: &Locator, actual: usize) -> Result<()> {
        let detail = if let Some(min) = self.min_count.filter(|min| actual < *min) {
            format!("expected at least {} elements by {}, found {}", min, locator, actual)
        } else if let Some(count) = self.count.filter(|count| actual != *count) {
            format!("expected {} elements by {}, found {}", count, locator, actual)
        } else {
            return Ok(());
        };

        Err(Error::Assertion(match &self.message {
            Some(message) => format!("{} ({})", message, detail),
            None => detail,
        }))
    }
}

/// Parse a scenario from YAML text
pub fn parse_scenario(content: &str) -> Result<TestScenario> {
    serde_yaml::from_str(content)
        .map_err(|e| Error::Config(format!("Failed to parse test scenario: {}", e)))
}

/// Load a scenario from a YAML file
pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read test scenario '{}': {}",
            path.display(),
            e
        ))
    })?;
    parse_scenario(&content)
}
