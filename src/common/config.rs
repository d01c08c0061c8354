//! Configuration file handling

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::paths::config_path;
use super::Result;

/// Environment variable that overrides `server.url`
pub const SERVER_URL_ENV: &str = "SMOKE_SERVER_URL";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Automation server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Capability defaults, overridden by the environment
    #[serde(default)]
    pub capabilities: CapabilityConfig,

    /// Failure diagnostics
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Automation server settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Base URL of the WebDriver endpoint
    #[serde(default = "default_url")]
    pub url: String,

    /// Timeout for ordinary commands
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for session creation, which may install the app
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout_secs: default_request_timeout(),
            session_timeout_secs: default_session_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://127.0.0.1:4723/wd/hub".to_string()
}
fn default_request_timeout() -> u64 {
    60
}
fn default_session_timeout() -> u64 {
    300
}

/// Capability values that may come from the config file
///
/// The four device fields are normally supplied by the device farm
/// through the environment; setting them here is useful for local runs.
#[derive(Debug, Deserialize, Clone)]
pub struct CapabilityConfig {
    pub platform_name: Option<String>,
    pub platform_version: Option<String>,
    pub device_name: Option<String>,
    pub app: Option<String>,

    /// Automation engine identifier
    #[serde(default = "default_automation_name")]
    pub automation_name: String,

    pub no_reset: Option<bool>,
    pub full_reset: Option<bool>,
    /// Seconds the server waits for a new command before ending the session
    pub new_command_timeout: Option<u64>,
    pub app_wait_activity: Option<String>,
    pub app_wait_package: Option<String>,

    /// Additional capabilities passed through verbatim
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            platform_name: None,
            platform_version: None,
            device_name: None,
            app: None,
            automation_name: default_automation_name(),
            no_reset: None,
            full_reset: None,
            new_command_timeout: None,
            app_wait_activity: None,
            app_wait_package: None,
            extra: BTreeMap::new(),
        }
    }
}

fn default_automation_name() -> String {
    "UiAutomator2".to_string()
}

/// What to collect when a scenario fails
#[derive(Debug, Deserialize, Clone)]
pub struct DiagnosticsConfig {
    /// Dump the UI hierarchy before teardown when a step fails
    #[serde(default = "default_true")]
    pub capture_source_on_failure: bool,

    /// Echo the hierarchy returned by `source` steps
    #[serde(default = "default_true")]
    pub print_source: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            capture_source_on_failure: true,
            print_source: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// used when present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.server.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://127.0.0.1:4723/wd/hub");
        assert_eq!(config.capabilities.automation_name, "UiAutomator2");
        assert!(config.diagnostics.capture_source_on_failure);
        assert!(config.capabilities.full_reset.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
[server]
url = "http://device-host:4723/wd/hub"

[capabilities]
full_reset = true
new_command_timeout = 180

[capabilities.extra]
"appium:autoGrantPermissions" = true
"#,
        )
        .unwrap();

        assert_eq!(config.server.url, "http://device-host:4723/wd/hub");
        assert_eq!(config.server.request_timeout_secs, 60);
        assert_eq!(config.capabilities.full_reset, Some(true));
        assert_eq!(config.capabilities.new_command_timeout, Some(180));
        assert_eq!(config.capabilities.automation_name, "UiAutomator2");
        assert_eq!(
            config.capabilities.extra.get("appium:autoGrantPermissions"),
            Some(&serde_json::Value::Bool(true))
        );
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::from_toml("[server\nurl = 3").unwrap_err();
        assert!(matches!(err, crate::common::Error::ConfigParse(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/smoke.toml"))).unwrap_err();
        assert!(matches!(err, crate::common::Error::FileRead { .. }));
    }

    #[test]
    fn test_env_overrides_server_url() {
        let mut config = Config::default();
        config.apply_env(|key| {
            (key == SERVER_URL_ENV).then(|| "http://farm:4723/wd/hub".to_string())
        });
        assert_eq!(config.server.url, "http://farm:4723/wd/hub");

        let mut config = Config::default();
        config.apply_env(|_| Some("   ".to_string()));
        assert_eq!(config.server.url, default_url());
    }
}
