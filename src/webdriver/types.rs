//! WebDriver wire types
//!
//! Appium speaks two dialects: the W3C protocol, where every response is
//! `{"value": ...}` and errors carry a string code, and the legacy JSON Wire
//! Protocol, where responses carry a numeric `status` and a top-level
//! `sessionId`. These types accept both.
//! See: https://www.w3.org/TR/webdriver/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// W3C web element identifier key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// JSON Wire Protocol element identifier key
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Any response from the automation server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Top-level session id (legacy protocol only)
    #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Numeric status (legacy protocol only, 0 = success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default)]
    pub value: Value,
}

/// Error reported inside a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    pub code: String,
    pub message: String,
}

impl ResponseEnvelope {
    /// Extract the error this envelope reports, if any
    pub fn error(&self) -> Option<WireError> {
        let message = || {
            self.value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };

        // W3C: {"value": {"error": "...", "message": "...", "stacktrace": "..."}}
        if let Some(code) = self.value.get("error").and_then(Value::as_str) {
            return Some(WireError {
                code: code.to_string(),
                message: message(),
            });
        }

        // Legacy: {"status": 7, "value": {"message": "..."}}
        match self.status {
            Some(status) if status != 0 => Some(WireError {
                code: legacy_status_code(status).to_string(),
                message: message(),
            }),
            _ => None,
        }
    }

    /// Session id from either protocol dialect
    pub fn session_id(&self) -> Option<String> {
        self.value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.session_id.clone())
            .filter(|id| !id.is_empty())
    }
}

/// Map a JSON Wire Protocol status number to its W3C error code
pub fn legacy_status_code(status: i64) -> &'static str {
    match status {
        6 => "invalid session id",
        7 => crate::common::error::NO_SUCH_ELEMENT,
        8 => "no such frame",
        9 => "unknown command",
        10 => "stale element reference",
        11 | 12 => "element not interactable",
        21 => "timeout",
        32 => "invalid selector",
        33 => "session not created",
        _ => "unknown error",
    }
}

/// Reference to an element held by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    id: String,
}

impl Element {
    /// Read an element reference in either dialect
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get(LEGACY_ELEMENT_KEY))
            .and_then(Value::as_str)
            .map(|id| Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Body of `GET /status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(body: Value) -> ResponseEnvelope {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_w3c_session_id() {
        let env = envelope(json!({
            "value": {"sessionId": "abc", "capabilities": {"platformName": "Android"}}
        }));
        assert_eq!(env.session_id().as_deref(), Some("abc"));
        assert!(env.error().is_none());
    }

    #[test]
    fn test_legacy_session_id() {
        let env = envelope(json!({"sessionId": "legacy-1", "status": 0, "value": {}}));
        assert_eq!(env.session_id().as_deref(), Some("legacy-1"));
        assert!(env.error().is_none());
    }

    #[test]
    fn test_w3c_error() {
        let env = envelope(json!({
            "value": {
                "error": "no such element",
                "message": "An element could not be located",
                "stacktrace": ""
            }
        }));
        let err = env.error().unwrap();
        assert_eq!(err.code, "no such element");
        assert_eq!(err.message, "An element could not be located");
    }

    #[test]
    fn test_legacy_error_maps_status() {
        let env = envelope(json!({"status": 7, "value": {"message": "not here"}}));
        let err = env.error().unwrap();
        assert_eq!(err.code, "no such element");
        assert_eq!(err.message, "not here");

        let env = envelope(json!({"status": 99, "value": null}));
        assert_eq!(env.error().unwrap().code, "unknown error");
    }

    #[test]
    fn test_element_reference_both_dialects() {
        let w3c = Element::from_value(&json!({"element-6066-11e4-a52e-4f735466cecf": "e-1"})).unwrap();
        assert_eq!(w3c.id(), "e-1");

        let legacy = Element::from_value(&json!({"ELEMENT": "e-2"})).unwrap();
        assert_eq!(legacy.id(), "e-2");

        assert!(Element::from_value(&json!({"id": "e-3"})).is_none());
        assert!(Element::from_value(&Value::Null).is_none());
    }

    #[test]
    fn test_empty_session_id_is_none() {
        let env = envelope(json!({"value": {"sessionId": ""}}));
        assert!(env.session_id().is_none());
    }
}
