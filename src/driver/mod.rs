//! Browser control surface
//!
//! The probe engine talks to the automation engine exclusively through
//! the [`Browser`] and [`Session`] traits, so any engine exposing this
//! capability set can back it. The shipped implementation speaks the
//! W3C WebDriver wire protocol ([`webdriver::WebDriverBrowser`]); the
//! tests use a scripted in-memory double ([`mock::MockBrowser`]).

pub mod launcher;
pub mod mock;
pub mod webdriver;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::Result;

/// A browser automation engine that can hand out isolated sessions
#[async_trait]
pub trait Browser: Send + Sync {
    /// Create a fresh browsing session. Each concurrent scenario run
    /// owns exactly one session; sessions are never shared.
    async fn new_session(&self) -> Result<Box<dyn Session>>;
}

/// One isolated browsing context with a single page
#[async_trait]
pub trait Session: Send {
    /// Navigate to an absolute URL, bounded by `timeout`
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait for the current document to reach a load state
    async fn wait_for_state(&mut self, state: LoadState, timeout: Duration) -> Result<()>;

    /// Rendered text of the page including nested frames
    async fn visible_text(&mut self) -> Result<String>;

    /// Whether an element matching the CSS selector is visible on the
    /// page or in one of its frames
    async fn element_visible(&mut self, selector: &str) -> Result<bool>;

    /// Issue an HTTP GET against the target (for api-response predicates)
    async fn fetch(&mut self, url: &str) -> Result<ApiProbe>;

    /// Snapshot of the current page for diagnostics
    async fn page_state(&mut self) -> Result<PageState>;

    /// Release the session. Must be called on every exit path.
    async fn close(&mut self) -> Result<()>;
}

/// Document load states, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// A response was committed; the document may still be loading
    Committed,
    /// DOM is parsed (`document.readyState` interactive or complete)
    DomContentLoaded,
    /// All subresources finished loading
    Complete,
}

/// Result of probing an HTTP endpoint directly
#[derive(Debug, Clone)]
pub struct ApiProbe {
    pub status: u16,
    pub body: String,
}

/// Observed page state attached to failed runs for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    pub title: String,
    /// Leading fragment of the rendered page text
    pub excerpt: String,
}

/// Maximum length of the text excerpt kept in [`PageState`]
pub(crate) const EXCERPT_LEN: usize = 200;

/// How deep to descend into nested frames when collecting text or
/// locating elements
pub(crate) const FRAME_DEPTH: u32 = 3;

/// Truncate page text to an excerpt on a char boundary
pub(crate) fn excerpt_of(text: &str) -> String {
    if text.len() <= EXCERPT_LEN {
        return text.to_string();
    }
    let mut end = EXCERPT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short_text_unchanged() {
        assert_eq!(excerpt_of("hello"), "hello");
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let excerpt = excerpt_of(&long);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.len() <= EXCERPT_LEN + 3);
    }
}
