//! W3C WebDriver session client
//!
//! Implements `BrowserSession` over plain HTTP against a running driver
//! (chromedriver by default at `http://localhost:9515`). The browser keeps
//! its login between runs through a persistent `--user-data-dir` profile.
//!
//! Every command carries a client-side timeout; the driver's own `timeout`
//! error is mapped to [`SyncError::Timeout`] as well.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

use super::locator::Locator;
use super::traits::{BrowserSession, ElementRef, Key, SessionLauncher};
use crate::error::{Result, SyncError};
use crate::BrowserConfig;

/// W3C element reference key in command payloads.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Extra client-side slack on top of the driver's own page-load timeout.
const NAVIGATION_SLACK: Duration = Duration::from_secs(5);
/// Keys per `/actions` request when typing long text.
const TYPE_BATCH: usize = 400;

/// Opens WebDriver sessions with the persistent profile.
#[derive(Clone)]
pub struct WebDriverLauncher {
    client: reqwest::Client,
    endpoint: String,
    profile_dir: PathBuf,
    headless: bool,
    navigation_timeout: Duration,
    command_timeout: Duration,
}

impl WebDriverLauncher {
    pub fn from_config(config: &BrowserConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: config.webdriver_url.trim_end_matches('/').to_string(),
            profile_dir: config.profile_dir.clone(),
            headless: config.headless,
            navigation_timeout: config.navigation_timeout,
            command_timeout: config.element_timeout,
        })
    }

    /// Override headless mode (a visible window is needed to log in).
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// `POST /session` payload.
    pub fn capabilities(&self) -> Value {
        let mut args = vec![
            format!("--user-data-dir={}", self.profile_dir.display()),
            "--window-size=1280,900".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "pageLoadStrategy": "eager",
                    "timeouts": {
                        "pageLoad": self.navigation_timeout.as_millis() as u64,
                        "implicit": 0
                    },
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl SessionLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        if let Err(e) = tokio::fs::create_dir_all(&self.profile_dir).await {
            tracing::warn!("Failed to create browser profile dir {:?}: {}", self.profile_dir, e);
        }

        let url = format!("{}/session", self.endpoint);
        let value = send(
            &self.client,
            Method::POST,
            &url,
            Some(self.capabilities()),
            self.navigation_timeout + NAVIGATION_SLACK,
            "new session",
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SyncError::WebDriver {
                command: "new session".to_string(),
                error: "invalid response".to_string(),
                message: "missing sessionId".to_string(),
            })?;

        tracing::info!(session_id, headless = self.headless, "Browser session started");

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.endpoint, session_id),
            navigation_timeout: self.navigation_timeout,
            command_timeout: self.command_timeout,
        }))
    }
}

/// One live WebDriver session.
pub struct WebDriverSession {
    client: reqwest::Client,
    base: String,
    navigation_timeout: Duration,
    command_timeout: Duration,
}

impl WebDriverSession {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        name: &str,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base, path);
        send(&self.client, method, &url, body, self.command_timeout, name).await
    }

    async fn perform_keys(&self, actions: Vec<Value>) -> Result<()> {
        let body = json!({
            "actions": [{
                "type": "key",
                "id": "keyboard",
                "actions": actions
            }]
        });
        self.command(Method::POST, "/actions", Some(body), "perform actions")
            .await?;
        self.command(Method::DELETE, "/actions", None, "release actions")
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<()> {
        let target = format!("{}/url", self.base);
        send(
            &self.client,
            Method::POST,
            &target,
            Some(json!({ "url": url })),
            self.navigation_timeout + NAVIGATION_SLACK,
            "navigate",
        )
        .await
        .map_err(|e| match e {
            SyncError::Timeout { .. } => SyncError::Timeout {
                action: format!("navigating to {}", url),
                timeout: self.navigation_timeout,
            },
            other => other,
        })?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.command(Method::GET, "/url", None, "get url").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let body = json!({ "using": locator.strategy(), "value": locator.value() });
        let value = self
            .command(Method::POST, "/elements", Some(body), "find elements")
            .await?;
        Ok(parse_elements(&value))
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        let path = format!("/element/{}/click", element.id());
        self.command(Method::POST, &path, Some(json!({})), "element click")
            .await?;
        Ok(())
    }

    async fn press(&self, chord: &[Key]) -> Result<()> {
        self.perform_keys(chord_actions(chord)).await
    }

    async fn type_text(&self, text: &str, delay: Duration) -> Result<()> {
        let chars: Vec<char> = text.chars().filter(|c| *c != '\r').collect();
        for batch in chars.chunks(TYPE_BATCH) {
            self.perform_keys(typing_actions(batch, delay)).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        send(
            &self.client,
            Method::DELETE,
            &self.base,
            None,
            self.command_timeout,
            "delete session",
        )
        .await?;
        tracing::debug!("Browser session closed");
        Ok(())
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
    timeout: Duration,
    name: &str,
) -> Result<Value> {
    let mut request = client.request(method, url).timeout(timeout);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = match request.send().await {
        Ok(r) => r,
        Err(e) if e.is_timeout() => {
            return Err(SyncError::Timeout {
                action: name.to_string(),
                timeout,
            })
        }
        Err(e) => return Err(e.into()),
    };

    let status = response.status();
    let payload: Value = response.json().await.unwrap_or(Value::Null);
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if error == "timeout" {
        return Err(SyncError::Timeout {
            action: name.to_string(),
            timeout,
        });
    }
    Err(SyncError::WebDriver {
        command: name.to_string(),
        error,
        message,
    })
}

fn parse_elements(value: &Value) -> Vec<ElementRef> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(ELEMENT_KEY).and_then(Value::as_str))
                .map(|id| ElementRef(id.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn key_value(c: char) -> String {
    match c {
        '\n' => Key::Enter.code().to_string(),
        c => c.to_string(),
    }
}

/// Keys down in order, up in reverse.
fn chord_actions(chord: &[Key]) -> Vec<Value> {
    let down = chord
        .iter()
        .map(|k| json!({ "type": "keyDown", "value": k.code().to_string() }));
    let up = chord
        .iter()
        .rev()
        .map(|k| json!({ "type": "keyUp", "value": k.code().to_string() }));
    down.chain(up).collect()
}

/// One down/up pair per character, with an optional pause after each.
fn typing_actions(chars: &[char], delay: Duration) -> Vec<Value> {
    let mut actions = Vec::with_capacity(chars.len() * 3);
    for c in chars {
        let value = key_value(*c);
        actions.push(json!({ "type": "keyDown", "value": value }));
        actions.push(json!({ "type": "keyUp", "value": value }));
        if !delay.is_zero() {
            actions.push(json!({ "type": "pause", "duration": delay.as_millis() as u64 }));
        }
    }
    actions
}
