//! W3C WebDriver wire client
//!
//! Talks to a WebDriver server (chromedriver, geckodriver) over its HTTP
//! JSON endpoints. Only the commands the probe engine needs are
//! implemented: session lifecycle, navigation, script execution, element
//! lookup, and frame switching.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::config::DriverConfig;
use crate::common::{Error, Result};

use super::{
    excerpt_of, ApiProbe, Browser, LoadState, PageState, Session, FRAME_DEPTH,
};

/// W3C element identifier key in wire responses
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Timeout applied to individual wire commands that are not themselves
/// navigation-bounded
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace added on top of the page-load timeout for the HTTP request
/// carrying the navigation command
const NAVIGATION_GRACE: Duration = Duration::from_secs(5);

/// Poll interval for load-state waits
const READY_POLL: Duration = Duration::from_millis(100);

const SCRIPT_INNER_TEXT: &str = "return document.body ? document.body.innerText : '';";
const SCRIPT_FRAME_COUNT: &str = "return window.frames.length;";
const SCRIPT_READY_STATE: &str = "return document.readyState;";
const SCRIPT_IS_VISIBLE: &str = "var el = arguments[0]; \
     return el.getClientRects().length > 0 \
         && window.getComputedStyle(el).visibility !== 'hidden';";

/// Every WebDriver response wraps its payload in a `value` field
#[derive(Deserialize)]
struct WireValue {
    value: Value,
}

/// A browser reachable through a WebDriver server
pub struct WebDriverBrowser {
    http: reqwest::Client,
    endpoint: String,
    driver: DriverConfig,
}

impl WebDriverBrowser {
    pub fn new(config: &DriverConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            driver: config.clone(),
        })
    }

    /// Build the new-session capabilities payload
    fn capabilities(config: &DriverConfig) -> Value {
        let mut args = vec![
            "--disable-dev-shm-usage".to_string(),
            format!("--window-size={},{}", config.window_width, config.window_height),
        ];
        if config.headless {
            args.push("--headless=new".to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn new_session(&self) -> Result<Box<dyn Session>> {
        let body = Self::capabilities(&self.driver);
        let response = self
            .http
            .post(format!("{}/session", self.endpoint))
            .timeout(COMMAND_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::SessionCreate(e.to_string()))?;

        let status = response.status();
        let wire: WireValue = response
            .json()
            .await
            .map_err(|e| Error::SessionCreate(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::SessionCreate(wire_error_message(&wire.value)));
        }

        let session_id = wire
            .value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::SessionCreate("missing sessionId in response".to_string()))?;

        Ok(Box::new(WebDriverSession {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            session_id: session_id.to_string(),
        }))
    }
}

fn wire_error_message(value: &Value) -> String {
    let kind = value.get("error").and_then(|v| v.as_str()).unwrap_or("unknown");
    let message = value.get("message").and_then(|v| v.as_str()).unwrap_or("");
    format!("{}: {}", kind, message)
}

/// One live WebDriver session
pub struct WebDriverSession {
    http: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl WebDriverSession {
    fn session_url(&self, suffix: &str) -> String {
        format!("{}/session/{}{}", self.endpoint, self.session_id, suffix)
    }

    /// Issue a wire command against this session
    async fn cmd(&self, method: Method, suffix: &str, body: Option<Value>) -> Result<Value> {
        self.cmd_with_timeout(method, suffix, body, COMMAND_TIMEOUT).await
    }

    async fn cmd_with_timeout(
        &self,
        method: Method,
        suffix: &str,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        let mut request = self
            .http
            .request(method, self.session_url(suffix))
            .timeout(timeout);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let wire: WireValue = response.json().await?;

        if !status.is_success() {
            let kind = wire
                .value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            let message = wire
                .value
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            return Err(Error::WebDriver { kind, message });
        }

        Ok(wire.value)
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.cmd(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn enter_frame(&self, index: u64) -> Result<()> {
        self.cmd(Method::POST, "/frame", Some(json!({ "id": index })))
            .await
            .map(|_| ())
    }

    async fn leave_frame(&self) -> Result<()> {
        self.cmd(Method::POST, "/frame/parent", Some(json!({})))
            .await
            .map(|_| ())
    }

    /// Rendered text of the current document and its nested frames
    fn collect_text(&self, depth: u32) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let mut text = self
                .execute(SCRIPT_INNER_TEXT, Vec::new())
                .await?
                .as_str()
                .map(str::to_string)
                .unwrap_or_default();

            if depth == 0 {
                return Ok(text);
            }

            let frames = self
                .execute(SCRIPT_FRAME_COUNT, Vec::new())
                .await?
                .as_u64()
                .unwrap_or(0);

            for index in 0..frames {
                if self.enter_frame(index).await.is_err() {
                    continue;
                }
                let nested = self.collect_text(depth - 1).await;
                // Restore focus before inspecting the result: a session
                // left inside a frame corrupts every later command.
                self.leave_frame().await?;
                if let Ok(nested) = nested {
                    if !nested.is_empty() {
                        text.push('\n');
                        text.push_str(&nested);
                    }
                }
            }

            Ok(text)
        })
    }

    /// Whether a visible element matches the selector in the current
    /// document or one of its nested frames
    fn find_visible<'a>(&'a self, selector: &'a str, depth: u32) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let elements = self
                .cmd(
                    Method::POST,
                    "/elements",
                    Some(json!({ "using": "css selector", "value": selector })),
                )
                .await?;

            if let Some(list) = elements.as_array() {
                for element in list {
                    if let Some(id) = element.get(ELEMENT_KEY).and_then(|v| v.as_str()) {
                        let visible = self
                            .execute(SCRIPT_IS_VISIBLE, vec![json!({ ELEMENT_KEY: id })])
                            .await?
                            .as_bool()
                            .unwrap_or(false);
                        if visible {
                            return Ok(true);
                        }
                    }
                }
            }

            if depth == 0 {
                return Ok(false);
            }

            let frames = self
                .execute(SCRIPT_FRAME_COUNT, Vec::new())
                .await?
                .as_u64()
                .unwrap_or(0);

            for index in 0..frames {
                if self.enter_frame(index).await.is_err() {
                    continue;
                }
                let nested = self.find_visible(selector, depth - 1).await;
                self.leave_frame().await?;
                if matches!(nested, Ok(true)) {
                    return Ok(true);
                }
            }

            Ok(false)
        })
    }
}

#[async_trait]
impl Session for WebDriverSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let timeout_ms = timeout.as_millis() as u64;
        self.cmd(
            Method::POST,
            "/timeouts",
            Some(json!({ "pageLoad": timeout_ms })),
        )
        .await?;

        let result = self
            .cmd_with_timeout(
                Method::POST,
                "/url",
                Some(json!({ "url": url })),
                timeout + NAVIGATION_GRACE,
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(Error::WebDriver { kind, message }) => {
                if kind == "timeout" {
                    Err(Error::NavigationTimeout {
                        url: url.to_string(),
                        timeout_ms,
                    })
                } else {
                    Err(Error::navigation(url, format!("{}: {}", kind, message)))
                }
            }
            Err(Error::Http(e)) if e.is_timeout() => Err(Error::NavigationTimeout {
                url: url.to_string(),
                timeout_ms,
            }),
            Err(Error::Http(e)) => Err(Error::navigation(url, e)),
            Err(e) => Err(e),
        }
    }

    async fn wait_for_state(&mut self, state: LoadState, timeout: Duration) -> Result<()> {
        // goto only returns once a response is committed
        if state == LoadState::Committed {
            return Ok(());
        }

        let deadline = Instant::now() + timeout;
        loop {
            let ready = self
                .execute(SCRIPT_READY_STATE, Vec::new())
                .await?
                .as_str()
                .map(str::to_string)
                .unwrap_or_default();

            let reached = match state {
                LoadState::Committed => true,
                LoadState::DomContentLoaded => ready == "interactive" || ready == "complete",
                LoadState::Complete => ready == "complete",
            };
            if reached {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(Error::webdriver(
                    "timeout",
                    &format!("document did not reach {:?} within {:?}", state, timeout),
                ));
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }

    async fn visible_text(&mut self) -> Result<String> {
        self.collect_text(FRAME_DEPTH).await
    }

    async fn element_visible(&mut self, selector: &str) -> Result<bool> {
        self.find_visible(selector, FRAME_DEPTH).await
    }

    async fn fetch(&mut self, url: &str) -> Result<ApiProbe> {
        let response = self.http.get(url).timeout(COMMAND_TIMEOUT).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiProbe { status, body })
    }

    async fn page_state(&mut self) -> Result<PageState> {
        let url = self
            .cmd(Method::GET, "/url", None)
            .await?
            .as_str()
            .map(str::to_string)
            .unwrap_or_default();
        let title = self
            .cmd(Method::GET, "/title", None)
            .await?
            .as_str()
            .map(str::to_string)
            .unwrap_or_default();
        let text = self
            .execute(SCRIPT_INNER_TEXT, Vec::new())
            .await?
            .as_str()
            .map(str::to_string)
            .unwrap_or_default();

        Ok(PageState {
            url,
            title,
            excerpt: excerpt_of(&text),
        })
    }

    async fn close(&mut self) -> Result<()> {
        self.cmd(Method::DELETE, "", None)
            .await
            .map(|_| ())
            .map_err(|e| Error::SessionClose(e.to_string()))
    }
}
