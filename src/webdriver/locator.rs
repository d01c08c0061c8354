//! Element locators

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// A query that finds UI elements in the running application
///
/// In scenario files a locator is written as a single-key map,
/// e.g. `{ class_name: android.widget.FrameLayout }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    ClassName(String),
    Xpath(String),
    Id(String),
    AccessibilityId(String),
}

impl Locator {
    /// WebDriver location strategy name
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::ClassName(_) => "class name",
            Locator::Xpath(_) => "xpath",
            Locator::Id(_) => "id",
            Locator::AccessibilityId(_) => "accessibility id",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::ClassName(v)
            | Locator::Xpath(v)
            | Locator::Id(v)
            | Locator::AccessibilityId(v) => v,
        }
    }

    /// Request body for the find element(s) commands
    pub fn to_json(&self) -> Value {
        json!({
            "using": self.strategy(),
            "value": self.value(),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.strategy(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies() {
        assert_eq!(Locator::ClassName("a".into()).strategy(), "class name");
        assert_eq!(Locator::Xpath("//a".into()).strategy(), "xpath");
        assert_eq!(Locator::Id("pkg:id/a".into()).strategy(), "id");
        assert_eq!(Locator::AccessibilityId("a".into()).strategy(), "accessibility id");
    }

    #[test]
    fn test_request_body() {
        let loc = Locator::Xpath(r#"//android.widget.Button[@text="Click Me"]"#.to_string());
        assert_eq!(
            loc.to_json(),
            json!({"using": "xpath", "value": "//android.widget.Button[@text=\"Click Me\"]"})
        );
    }

    #[test]
    fn test_yaml_single_key_map() {
        let loc: Locator = serde_yaml::from_str("class_name: android.widget.FrameLayout").unwrap();
        assert_eq!(loc, Locator::ClassName("android.widget.FrameLayout".to_string()));

        let loc: Locator = serde_yaml::from_str("accessibility_id: login").unwrap();
        assert_eq!(loc, Locator::AccessibilityId("login".to_string()));
    }

    #[test]
    fn test_display() {
        let loc = Locator::ClassName("android.widget.FrameLayout".to_string());
        assert_eq!(loc.to_string(), "class name 'android.widget.FrameLayout'");
    }
}
