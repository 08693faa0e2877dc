//! Scripted in-memory browser
//!
//! Stands in for a real WebDriver server in the test suite: each path is
//! scripted with a navigation outcome and page content, and session
//! lifecycle is observable so tests can assert that every session is
//! released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::common::{Error, Result};

use super::{excerpt_of, ApiProbe, Browser, LoadState, PageState, Session};

/// Scripted behavior for one path
#[derive(Clone, Default)]
pub struct MockPage {
    /// Navigation fails with this reason
    pub nav_error: Option<String>,
    /// Navigation times out instead of completing
    pub nav_timeout: bool,
    /// Rendered text of the page
    pub text: String,
    /// Selectors that count as visible on this page
    pub visible_selectors: Vec<String>,
    /// Number of text polls that must elapse before the text renders
    pub text_after_polls: u32,
}

impl MockPage {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn erroring(reason: &str) -> Self {
        Self {
            nav_error: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn timing_out() -> Self {
        Self {
            nav_timeout: true,
            ..Default::default()
        }
    }

    pub fn text_after_polls(text: &str, polls: u32) -> Self {
        Self {
            text: text.to_string(),
            text_after_polls: polls,
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.visible_selectors.push(selector.to_string());
        self
    }
}

/// A browser whose pages are scripted up front
#[derive(Default)]
pub struct MockBrowser {
    pages: HashMap<String, MockPage>,
    api: HashMap<String, (u16, String)>,
    fail_sessions: bool,
    open_sessions: Arc<AtomicUsize>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, path: &str, page: MockPage) -> Self {
        self.pages.insert(path.to_string(), page);
        self
    }

    pub fn with_api(mut self, path: &str, status: u16, body: &str) -> Self {
        self.api.insert(path.to_string(), (status, body.to_string()));
        self
    }

    /// Every new_session call fails, simulating an unreachable browser
    pub fn failing_sessions(mut self) -> Self {
        self.fail_sessions = true;
        self
    }

    /// Shared counter of sessions currently open. Clone it before moving
    /// the browser behind an `Arc<dyn Browser>`.
    pub fn session_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.open_sessions)
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn new_session(&self) -> Result<Box<dyn Session>> {
        if self.fail_sessions {
            return Err(Error::SessionCreate("mock browser refused session".to_string()));
        }

        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            pages: self.pages.clone(),
            api: self.api.clone(),
            counter: Arc::clone(&self.open_sessions),
            current: None,
            polls: HashMap::new(),
            closed: false,
        }))
    }
}

struct MockSession {
    pages: HashMap<String, MockPage>,
    api: HashMap<String, (u16, String)>,
    counter: Arc<AtomicUsize>,
    current: Option<String>,
    polls: HashMap<String, u32>,
    closed: bool,
}

/// Path component of an absolute URL
fn path_of(url: &str) -> &str {
    if let Some(scheme) = url.find("://") {
        let rest = &url[scheme + 3..];
        match rest.find('/') {
            Some(slash) => &rest[slash..],
            None => "/",
        }
    } else {
        url
    }
}

impl MockSession {
    fn current_page(&self) -> Option<&MockPage> {
        self.current.as_ref().and_then(|path| self.pages.get(path))
    }
}

#[async_trait]
impl Session for MockSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let path = path_of(url).to_string();

        match self.pages.get(&path) {
            None => Err(Error::navigation(url, "no route scripted")),
            Some(page) if page.nav_timeout => Err(Error::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            Some(page) => {
                if let Some(reason) = &page.nav_error {
                    return Err(Error::navigation(url, reason));
                }
                self.current = Some(path);
                Ok(())
            }
        }
    }

    async fn wait_for_state(&mut self, _state: LoadState, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn visible_text(&mut self) -> Result<String> {
        let Some(path) = self.current.clone() else {
            return Ok(String::new());
        };
        let Some(page) = self.pages.get(&path) else {
            return Ok(String::new());
        };

        let seen = self.polls.entry(path).or_insert(0);
        let visible = *seen >= page.text_after_polls;
        *seen += 1;

        Ok(if visible { page.text.clone() } else { String::new() })
    }

    async fn element_visible(&mut self, selector: &str) -> Result<bool> {
        Ok(self
            .current_page()
            .map(|page| page.visible_selectors.iter().any(|s| s == selector))
            .unwrap_or(false))
    }

    async fn fetch(&mut self, url: &str) -> Result<ApiProbe> {
        match self.api.get(path_of(url)) {
            Some((status, body)) => Ok(ApiProbe {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(ApiProbe {
                status: 404,
                body: String::new(),
            }),
        }
    }

    async fn page_state(&mut self) -> Result<PageState> {
        let url = self.current.clone().unwrap_or_else(|| "about:blank".to_string());
        let text = self.current_page().map(|p| p.text.clone()).unwrap_or_default();
        Ok(PageState {
            url,
            title: "mock".to_string(),
            excerpt: excerpt_of(&text),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.counter.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
