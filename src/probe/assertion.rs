//! Predicate evaluation with bounded polling
//!
//! Replaces fixed sleeps with an explicit poll-until-deadline loop: the
//! first satisfied poll wins, and both the assertion's own timeout and
//! the scenario's overall deadline bound the wait.

use std::cmp;
use std::time::{Duration, Instant};

use crate::driver::Session;
use crate::scenario::Predicate;

use super::resolve_url;

/// Evaluates success predicates against live page state
pub struct AssertionEngine {
    base_url: String,
    poll_interval: Duration,
}

impl AssertionEngine {
    pub fn new(base_url: &str, poll_interval: Duration) -> Self {
        Self {
            base_url: base_url.to_string(),
            poll_interval,
        }
    }

    /// Poll the predicate until it holds or time runs out
    ///
    /// Returns `true` on the first satisfied poll. Gives up at
    /// whichever comes first of `timeout` and `budget_deadline`; never
    /// blocks indefinitely. Evaluation errors (a page navigating away
    /// mid-poll, a dropped frame) count as unsatisfied polls.
    pub async fn check(
        &self,
        session: &mut dyn Session,
        predicate: &Predicate,
        timeout: Duration,
        budget_deadline: Instant,
    ) -> bool {
        let deadline = cmp::min(Instant::now() + timeout, budget_deadline);

        loop {
            match self.evaluate(session, predicate).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "predicate evaluation errored, poll unsatisfied");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(cmp::min(self.poll_interval, deadline - now)).await;
        }
    }

    /// Evaluate the predicate once against current page state
    async fn evaluate(
        &self,
        session: &mut dyn Session,
        predicate: &Predicate,
    ) -> crate::common::Result<bool> {
        match predicate {
            Predicate::TextVisible { value } => {
                Ok(session.visible_text().await?.contains(value.as_str()))
            }
            Predicate::ElementVisible { value } => session.element_visible(value).await,
            Predicate::ApiResponse {
                path,
                status,
                body_contains,
            } => {
                let probe = session.fetch(&resolve_url(&self.base_url, path)).await?;
                let status_ok = match status {
                    Some(code) => probe.status == *code,
                    None => probe.status < 400,
                };
                let body_ok = body_contains
                    .as_ref()
                    .map(|fragment| probe.body.contains(fragment.as_str()))
                    .unwrap_or(true);
                Ok(status_ok && body_ok)
            }
        }
    }
}
