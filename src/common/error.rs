//! Error types for the smoke runner
//!
//! Error messages are meant to be read in a CI log, so they name the
//! environment variable, locator or WebDriver command involved.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// WebDriver error code for a locator that matched nothing
pub const NO_SUCH_ELEMENT: &str = "no such element";

/// Main error type for the smoke runner
#[derive(Error, Debug)]
pub enum Error {
    // === Session Errors ===
    #[error("Failed to start automation session: {0}")]
    SessionInit(String),

    #[error("Failed to quit automation session {session_id}: {message}")]
    Teardown { session_id: String, message: String },

    // === Element Errors ===
    #[error("Element not found using {locator}")]
    ElementNotFound { locator: String },

    // === WebDriver Protocol Errors ===
    #[error("WebDriver command '{command}' failed ({code}): {message}")]
    WebDriver {
        command: String,
        code: String,
        message: String,
    },

    #[error("Unexpected response from automation server: {0}")]
    Protocol(String),

    #[error("Automation server unreachable at {url}: {source}")]
    ServerUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Assertion Errors ===
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Interrupted by {0}")]
    Interrupted(String),

    #[error("Test '{name}' failed: {reason}")]
    ScenarioFailed { name: String, reason: String },

    // === Configuration Errors ===
    #[error("Missing capability '{capability}'. Set the {env_var} environment variable")]
    MissingCapability {
        capability: &'static str,
        env_var: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a WebDriver command failure
    pub fn webdriver(command: &str, code: &str, message: &str) -> Self {
        Self::WebDriver {
            command: command.to_string(),
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a teardown failure for a session
    pub fn teardown(session_id: &str, message: impl std::fmt::Display) -> Self {
        Self::Teardown {
            session_id: session_id.to_string(),
            message: message.to_string(),
        }
    }

    /// True if the server reported that a locator matched nothing
    pub fn is_no_such_element(&self) -> bool {
        match self {
            Self::ElementNotFound { .. } => true,
            Self::WebDriver { code, .. } => code == NO_SUCH_ELEMENT,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_such_element_detection() {
        assert!(Error::webdriver("findElement", NO_SUCH_ELEMENT, "gone").is_no_such_element());
        assert!(Error::ElementNotFound {
            locator: "xpath //a".to_string()
        }
        .is_no_such_element());
        assert!(!Error::webdriver("click", "stale element reference", "x").is_no_such_element());
        assert!(!Error::Assertion("nope".to_string()).is_no_such_element());
    }

    #[test]
    fn test_missing_capability_names_env_var() {
        let err = Error::MissingCapability {
            capability: "deviceName",
            env_var: "DEVICEFARM_DEVICE_NAME",
        };
        let msg = err.to_string();
        assert!(msg.contains("deviceName"));
        assert!(msg.contains("DEVICEFARM_DEVICE_NAME"));
    }
}
