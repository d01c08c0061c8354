//! WebDriver client for communicating with the automation server
//!
//! Every operation is a single JSON-over-HTTP round trip. Responses are
//! unwrapped from the protocol envelope and errors reported in the body are
//! turned into [`Error::WebDriver`].

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::common::config::ServerConfig;
use crate::common::{Error, Result};

use super::capabilities::Capabilities;
use super::locator::Locator;
use super::types::{Element, ResponseEnvelope, ServerStatus};

/// Client for one automation server endpoint
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    http: reqwest::Client,
    /// Endpoint root without trailing slash, e.g. `http://127.0.0.1:4723/wd/hub`
    base_url: String,
    /// Timeout for session creation (app install and launch happen here)
    session_timeout: Duration,
}

impl WebDriverClient {
    /// Create a client for the given endpoint
    pub fn new(base_url: &str, request_timeout: Duration, session_timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Server URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            session_timeout,
        })
    }

    /// Create a client from the `[server]` config section
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(
            &config.url,
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.session_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query server readiness
    pub async fn status(&self) -> Result<ServerStatus> {
        let envelope = self
            .execute("status", Method::GET, "/status", None, None)
            .await?;
        serde_json::from_value(envelope.value)
            .map_err(|e| Error::Protocol(format!("status: {}", e)))
    }

    /// Start a new session with the given capabilities
    pub async fn new_session(&self, caps: &Capabilities) -> Result<Session> {
        let payload = caps.new_session_payload()?;
        let envelope = self
            .execute(
                "newSession",
                Method::POST,
                "/session",
                Some(payload),
                Some(self.session_timeout),
            )
            .await
            .map_err(|e| Error::SessionInit(e.to_string()))?;

        let id = envelope.session_id().ok_or_else(|| {
            Error::SessionInit(format!("server returned no session id: {}", envelope.value))
        })?;

        tracing::info!(session_id = %id, "Session created");

        Ok(Session {
            client: self.clone(),
            id,
            released: false,
        })
    }

    /// Send one command and unwrap the response envelope
    async fn execute(
        &self,
        command: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<ResponseEnvelope> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("WebDriver >>> {} {} ({})", method, url, command);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            tracing::debug!("WebDriver >>> {}", body);
            request = request.json(&body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                Error::ServerUnreachable {
                    url: self.base_url.clone(),
                    source: e,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("WebDriver <<< {} {}", status.as_u16(), text);

        let envelope: ResponseEnvelope = if text.trim().is_empty() {
            ResponseEnvelope::default()
        } else {
            serde_json::from_str(&text).map_err(|e| {
                Error::Protocol(format!(
                    "{}: invalid JSON in HTTP {} response: {}",
                    command, status, e
                ))
            })?
        };

        if let Some(err) = envelope.error() {
            return Err(Error::webdriver(command, &err.code, &err.message));
        }

        if !status.is_success() {
            return Err(Error::webdriver(
                command,
                "unknown error",
                &format!("HTTP {}", status),
            ));
        }

        Ok(envelope)
    }
}

/// An open automation session
///
/// [`Session::quit`] consumes the session, so it can be released only once.
#[derive(Debug)]
pub struct Session {
    client: WebDriverClient,
    id: String,
    released: bool,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn path(&self, suffix: &str) -> String {
        format!("/session/{}{}", self.id, suffix)
    }

    async fn get(&self, command: &str, suffix: &str) -> Result<Value> {
        let envelope = self
            .client
            .execute(command, Method::GET, &self.path(suffix), None, None)
            .await?;
        Ok(envelope.value)
    }

    async fn post(&self, command: &str, suffix: &str, body: Value) -> Result<Value> {
        let envelope = self
            .client
            .execute(command, Method::POST, &self.path(suffix), Some(body), None)
            .await?;
        Ok(envelope.value)
    }

    /// Wait on the client side, the way `sleep` does in the WebDriver bindings
    pub async fn sleep(&self, duration: Duration) {
        tracing::debug!("Sleeping {:?}", duration);
        tokio::time::sleep(duration).await;
    }

    /// Package of the app in the foreground (Android)
    pub async fn current_package(&self) -> Result<String> {
        let value = self
            .get("getCurrentPackage", "/appium/device/current_package")
            .await?;
        string_value("getCurrentPackage", value)
    }

    /// Activity in the foreground (Android)
    pub async fn current_activity(&self) -> Result<String> {
        let value = self
            .get("getCurrentActivity", "/appium/device/current_activity")
            .await?;
        string_value("getCurrentActivity", value)
    }

    /// Dump of the current UI hierarchy
    pub async fn source(&self) -> Result<String> {
        let value = self.get("getPageSource", "/source").await?;
        string_value("getPageSource", value)
    }

    /// Find the first element matching a locator
    pub async fn find_element(&self, locator: &Locator) -> Result<Element> {
        let value = self
            .post("findElement", "/element", locator.to_json())
            .await
            .map_err(|e| not_found(e, locator))?;

        Element::from_value(&value).ok_or_else(|| {
            Error::Protocol(format!("findElement: no element reference in {}", value))
        })
    }

    /// Find all elements matching a locator; none is not an error
    pub async fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>> {
        let value = match self.post("findElements", "/elements", locator.to_json()).await {
            Ok(value) => value,
            // Some legacy servers answer an empty match with an error
            Err(e) if e.is_no_such_element() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    Element::from_value(item).ok_or_else(|| {
                        Error::Protocol(format!("findElements: no element reference in {}", item))
                    })
                })
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::Protocol(format!(
                "findElements: expected an array, got {}",
                other
            ))),
        }
    }

    pub async fn click(&self, element: &Element) -> Result<()> {
        let suffix = format!("/element/{}/click", element.id());
        self.post("elementClick", &suffix, serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn is_displayed(&self, element: &Element) -> Result<bool> {
        let suffix = format!("/element/{}/displayed", element.id());
        let value = self.get("isElementDisplayed", &suffix).await?;
        value.as_bool().ok_or_else(|| {
            Error::Protocol(format!("isElementDisplayed: expected a boolean, got {}", value))
        })
    }

    pub async fn text(&self, element: &Element) -> Result<String> {
        let suffix = format!("/element/{}/text", element.id());
        let value = self.get("getElementText", &suffix).await?;
        string_value("getElementText", value)
    }

    /// End the session on the server
    pub async fn quit(mut self) -> Result<()> {
        self.released = true;
        tracing::info!(session_id = %self.id, "Quitting session");
        self.client
            .execute("deleteSession", Method::DELETE, &self.path(""), None, None)
            .await
            .map(|_| ())
            .map_err(|e| Error::teardown(&self.id, e))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(session_id = %self.id, "Session dropped without quit; it stays open on the server");
        }
    }
}

/// Read a string result; `null` reads as empty
fn string_value(command: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Err(Error::Protocol(format!(
            "{}: expected a string, got {}",
            command, other
        ))),
    }
}

/// Attach the locator to a "no such element" failure
fn not_found(error: Error, locator: &Locator) -> Error {
    if error.is_no_such_element() {
        Error::ElementNotFound {
            locator: locator.to_string(),
        }
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = WebDriverClient::new(
            " http://127.0.0.1:4723/wd/hub/ ",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:4723/wd/hub");
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = WebDriverClient::new("127.0.0.1:4723", Duration::from_secs(1), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_string_value_accepts_null() {
        assert_eq!(string_value("x", Value::Null).unwrap(), "");
        assert_eq!(string_value("x", Value::String("a".into())).unwrap(), "a");
        assert!(string_value("x", Value::Bool(true)).is_err());
    }

    #[test]
    fn test_not_found_attaches_locator() {
        let locator = Locator::Xpath("//a".to_string());
        let err = not_found(
            Error::webdriver("findElement", "no such element", "missing"),
            &locator,
        );
        match err {
            Error::ElementNotFound { locator } => assert_eq!(locator, "xpath '//a'"),
            other => panic!("Expected ElementNotFound, got {:?}", other),
        }

        let err = not_found(Error::Assertion("x".into()), &locator);
        assert!(matches!(err, Error::Assertion(_)));
    }
}
