//! Navigation with bounded timeouts
//!
//! The navigator owns URL resolution and outcome classification; failed
//! navigations become typed attempt records rather than errors, so the
//! probe strategy can decide whether to continue.

use std::time::{Duration, Instant};

use chrono::Utc;

use crate::driver::{LoadState, Session};

use super::{resolve_url, AttemptOutcome, NavigationAttempt};

/// How long to wait for the DOM to settle after a committed navigation
const READY_WAIT: Duration = Duration::from_secs(3);

/// Performs single navigations against the target base URL
pub struct Navigator {
    base_url: String,
}

impl Navigator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    /// Navigate to one candidate path, bounded by `timeout`
    ///
    /// Never fails: timeouts and transport errors are recorded in the
    /// returned attempt. No retries; retry policy belongs to the caller.
    pub async fn open(
        &self,
        session: &mut dyn Session,
        path: &str,
        timeout: Duration,
    ) -> NavigationAttempt {
        let url = resolve_url(&self.base_url, path);
        let started_at = Utc::now();
        let start = Instant::now();

        let (outcome, error) = match session.goto(&url, timeout).await {
            Ok(()) => {
                // DOM parsed is enough to start asserting; a slow
                // subresource must not fail the attempt.
                if let Err(e) = session
                    .wait_for_state(LoadState::DomContentLoaded, READY_WAIT)
                    .await
                {
                    tracing::debug!(%url, error = %e, "load state wait did not settle");
                }
                (AttemptOutcome::Succeeded, None)
            }
            Err(e) if e.is_navigation_timeout() => {
                (AttemptOutcome::TimedOut, Some(e.to_string()))
            }
            Err(e) => (AttemptOutcome::Errored, Some(e.to_string())),
        };

        tracing::debug!(path, ?outcome, "navigation attempt finished");

        NavigationAttempt {
            path: path.to_string(),
            started_at,
            outcome,
            error,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{MockBrowser, MockPage};
    use crate::driver::Browser;

    #[tokio::test]
    async fn test_open_classifies_success() {
        let browser = MockBrowser::new().with_page("/login", MockPage::with_text("Sign in"));
        let mut session = browser.new_session().await.unwrap();

        let navigator = Navigator::new("http://localhost:3000");
        let attempt = navigator
            .open(session.as_mut(), "/login", Duration::from_secs(1))
            .await;

        assert_eq!(attempt.outcome, AttemptOutcome::Succeeded);
        assert_eq!(attempt.path, "/login");
        assert!(attempt.error.is_none());
    }

    #[tokio::test]
    async fn test_open_classifies_timeout() {
        let browser = MockBrowser::new().with_page("/slow", MockPage::timing_out());
        let mut session = browser.new_session().await.unwrap();

        let navigator = Navigator::new("http://localhost:3000");
        let attempt = navigator
            .open(session.as_mut(), "/slow", Duration::from_millis(50))
            .await;

        assert_eq!(attempt.outcome, AttemptOutcome::TimedOut);
        assert!(attempt.error.is_some());
    }

    #[tokio::test]
    async fn test_open_classifies_error() {
        let browser = MockBrowser::new();
        let mut session = browser.new_session().await.unwrap();

        let navigator = Navigator::new("http://localhost:3000");
        let attempt = navigator
            .open(session.as_mut(), "/missing", Duration::from_secs(1))
            .await;

        assert_eq!(attempt.outcome, AttemptOutcome::Errored);
    }
}
