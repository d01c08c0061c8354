//! WebDriver / Appium client
//!
//! This module implements the client side of the JSON-over-HTTP automation
//! protocol spoken by Appium servers.

pub mod capabilities;
pub mod client;
pub mod locator;
pub mod types;

pub use capabilities::Capabilities;
pub use client::{Session, WebDriverClient};
pub use locator::Locator;
pub use types::{Element, ServerStatus};
