//! Session capabilities
//!
//! The device farm describes the target through environment variables; the
//! config file and scenario overrides fill in the session lifecycle flags.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::common::config::CapabilityConfig;
use crate::common::{Error, Result};

pub const PLATFORM_NAME_ENV: &str = "DEVICEFARM_DEVICE_PLATFORM_NAME";
pub const PLATFORM_VERSION_ENV: &str = "DEVICEFARM_DEVICE_OS_VERSION";
pub const DEVICE_NAME_ENV: &str = "DEVICEFARM_DEVICE_NAME";
pub const APP_PATH_ENV: &str = "DEVICEFARM_APP_PATH";

/// W3C standard capabilities, sent without a vendor prefix
const STANDARD_CAPABILITIES: &[&str] = &[
    "acceptInsecureCerts",
    "browserName",
    "browserVersion",
    "pageLoadStrategy",
    "platformName",
    "proxy",
    "setWindowRect",
    "strictFileInteractability",
    "timeouts",
    "unhandledPromptBehavior",
    "webSocketUrl",
];

/// Capabilities negotiated at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub platform_name: String,
    pub platform_version: String,
    pub device_name: String,
    pub app: String,
    pub automation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_reset: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_reset: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_command_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_wait_activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_wait_package: Option<String>,
    /// Anything else, passed through verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Capabilities {
    /// Build capabilities from config, with the environment taking precedence
    ///
    /// Empty environment values count as unset.
    pub fn resolve<F>(config: &CapabilityConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |env_var: &str, fallback: &Option<String>| {
            lookup(env_var)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| fallback.clone())
                .unwrap_or_default()
        };

        Self {
            platform_name: pick(PLATFORM_NAME_ENV, &config.platform_name),
            platform_version: pick(PLATFORM_VERSION_ENV, &config.platform_version),
            device_name: pick(DEVICE_NAME_ENV, &config.device_name),
            app: pick(APP_PATH_ENV, &config.app),
            automation_name: config.automation_name.clone(),
            no_reset: config.no_reset,
            full_reset: config.full_reset,
            new_command_timeout: config.new_command_timeout,
            app_wait_activity: config.app_wait_activity.clone(),
            app_wait_package: config.app_wait_package.clone(),
            extra: config.extra.clone(),
        }
    }

    /// Build capabilities from config and the process environment
    pub fn from_env(config: &CapabilityConfig) -> Self {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    /// Apply capability overrides keyed by wire name (e.g. `fullReset`)
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, Value>) -> Result<()> {
        if overrides.is_empty() {
            return Ok(());
        }

        let mut map = self.desired()?;
        for (key, value) in overrides {
            map.insert(key.clone(), value.clone());
        }

        *self = serde_json::from_value(Value::Object(map))
            .map_err(|e| Error::Config(format!("Invalid capability override: {}", e)))?;
        Ok(())
    }

    /// Check that the required fields are present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("platformName", PLATFORM_NAME_ENV, &self.platform_name),
            ("platformVersion", PLATFORM_VERSION_ENV, &self.platform_version),
            ("deviceName", DEVICE_NAME_ENV, &self.device_name),
            ("app", APP_PATH_ENV, &self.app),
        ];

        for (capability, env_var, value) in required {
            if value.trim().is_empty() {
                return Err(Error::MissingCapability {
                    capability,
                    env_var,
                });
            }
        }

        if self.automation_name.trim().is_empty() {
            return Err(Error::Config(
                "capabilities.automation_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Capabilities with plain keys, as legacy servers expect them
    pub fn desired(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Config(format!(
                "Capabilities did not serialize to an object: {}",
                other
            ))),
        }
    }

    /// Capabilities with W3C vendor prefixes
    ///
    /// Standard capabilities keep their names; every other key that is not
    /// already namespaced gets the `appium:` prefix.
    pub fn w3c(&self) -> Result<Map<String, Value>> {
        Ok(self
            .desired()?
            .into_iter()
            .map(|(key, value)| {
                if STANDARD_CAPABILITIES.contains(&key.as_str()) || key.contains(':') {
                    (key, value)
                } else {
                    (format!("appium:{}", key), value)
                }
            })
            .collect())
    }

    /// Body of the new session request, understood by W3C and legacy servers
    pub fn new_session_payload(&self) -> Result<Value> {
        Ok(json!({
            "capabilities": {
                "alwaysMatch": self.w3c()?,
                "firstMatch": [{}],
            },
            "desiredCapabilities": self.desired()?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn farm_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (PLATFORM_NAME_ENV, "Android".to_string()),
            (PLATFORM_VERSION_ENV, "13".to_string()),
            (DEVICE_NAME_ENV, "Pixel 7".to_string()),
            (APP_PATH_ENV, "/tmp/app.apk".to_string()),
        ])
    }

    fn resolve_with(env: &HashMap<&'static str, String>, config: &CapabilityConfig) -> Capabilities {
        Capabilities::resolve(config, |key| env.get(key).cloned())
    }

    #[test]
    fn test_resolve_from_env() {
        let caps = resolve_with(&farm_env(), &CapabilityConfig::default());
        assert_eq!(caps.platform_name, "Android");
        assert_eq!(caps.platform_version, "13");
        assert_eq!(caps.device_name, "Pixel 7");
        assert_eq!(caps.app, "/tmp/app.apk");
        assert_eq!(caps.automation_name, "UiAutomator2");
        assert!(caps.validate().is_ok());
    }

    #[test]
    fn test_env_beats_config_and_empty_env_falls_back() {
        let mut env = farm_env();
        env.insert(DEVICE_NAME_ENV, "".to_string());
        let config = CapabilityConfig {
            device_name: Some("Local Emulator".to_string()),
            platform_name: Some("iOS".to_string()),
            ..Default::default()
        };

        let caps = resolve_with(&env, &config);
        assert_eq!(caps.device_name, "Local Emulator");
        assert_eq!(caps.platform_name, "Android");
    }

    #[test]
    fn test_missing_required_names_env_var() {
        let mut env = farm_env();
        env.remove(APP_PATH_ENV);
        let caps = resolve_with(&env, &CapabilityConfig::default());

        match caps.validate() {
            Err(Error::MissingCapability { capability, env_var }) => {
                assert_eq!(capability, "app");
                assert_eq!(env_var, APP_PATH_ENV);
            }
            other => panic!("Expected MissingCapability, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_set_typed_and_extra_fields() {
        let mut caps = resolve_with(&farm_env(), &CapabilityConfig::default());
        let overrides = BTreeMap::from([
            ("noReset".to_string(), json!(false)),
            ("fullReset".to_string(), json!(true)),
            ("newCommandTimeout".to_string(), json!(180)),
            ("appWaitActivity".to_string(), json!("*")),
            ("autoGrantPermissions".to_string(), json!(true)),
        ]);

        caps.apply_overrides(&overrides).unwrap();
        assert_eq!(caps.no_reset, Some(false));
        assert_eq!(caps.full_reset, Some(true));
        assert_eq!(caps.new_command_timeout, Some(180));
        assert_eq!(caps.app_wait_activity.as_deref(), Some("*"));
        assert_eq!(caps.extra.get("autoGrantPermissions"), Some(&json!(true)));
        assert_eq!(caps.device_name, "Pixel 7");
    }

    #[test]
    fn test_override_with_wrong_type_is_rejected() {
        let mut caps = resolve_with(&farm_env(), &CapabilityConfig::default());
        let overrides = BTreeMap::from([("fullReset".to_string(), json!("yes"))]);
        assert!(matches!(caps.apply_overrides(&overrides), Err(Error::Config(_))));
    }

    #[test]
    fn test_wire_forms() {
        let mut caps = resolve_with(&farm_env(), &CapabilityConfig::default());
        caps.full_reset = Some(true);
        caps.extra.insert("appium:autoLaunch".to_string(), json!(true));

        let desired = caps.desired().unwrap();
        assert_eq!(desired["platformName"], "Android");
        assert_eq!(desired["automationName"], "UiAutomator2");
        assert_eq!(desired["fullReset"], true);
        assert!(!desired.contains_key("noReset"));

        let w3c = caps.w3c().unwrap();
        assert_eq!(w3c["platformName"], "Android");
        assert_eq!(w3c["appium:deviceName"], "Pixel 7");
        assert_eq!(w3c["appium:fullReset"], true);
        assert_eq!(w3c["appium:autoLaunch"], true);
        assert!(!w3c.contains_key("appium:appium:autoLaunch"));

        let payload = caps.new_session_payload().unwrap();
        assert_eq!(payload["capabilities"]["alwaysMatch"]["appium:app"], "/tmp/app.apk");
        assert_eq!(payload["capabilities"]["firstMatch"], json!([{}]));
        assert_eq!(payload["desiredCapabilities"]["app"], "/tmp/app.apk");
    }

    #[test]
    fn test_standard_capabilities_stay_unprefixed() {
        let mut caps = resolve_with(&farm_env(), &CapabilityConfig::default());
        caps.extra.insert("browserName".to_string(), json!("Chrome"));
        caps.extra.insert("acceptInsecureCerts".to_string(), json!(true));
        caps.extra.insert("timeouts".to_string(), json!({"implicit": 0}));
        caps.extra.insert("autoGrantPermissions".to_string(), json!(true));

        let w3c = caps.w3c().unwrap();
        assert_eq!(w3c["browserName"], "Chrome");
        assert_eq!(w3c["acceptInsecureCerts"], true);
        assert_eq!(w3c["timeouts"], json!({"implicit": 0}));
        assert_eq!(w3c["appium:autoGrantPermissions"], true);
        assert!(!w3c.contains_key("appium:browserName"));
        assert!(!w3c.contains_key("autoGrantPermissions"));
    }
}
