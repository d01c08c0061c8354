//! Device farm smoke runner
//!
//! This library drives a mobile application through an Appium/WebDriver
//! automation server and checks a short scenario against it.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;
pub mod webdriver;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{run_scenario, RunOptions, TestResult, TestScenario};
pub use webdriver::{Capabilities, Locator, WebDriverClient};
