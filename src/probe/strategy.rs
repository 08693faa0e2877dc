//! Ordered candidate-path probing
//!
//! Tries a scenario's candidate paths strictly in declared order, with
//! partial-failure tolerance: one bad path records an attempt and moves
//! on. Deterministic by construction; no reordering, no parallel
//! speculation.

use std::cmp;
use std::time::{Duration, Instant};

use crate::driver::Session;
use crate::scenario::Scenario;

use super::{AssertionEngine, AttemptOutcome, NavigationAttempt, Navigator, ProbeOutcome};

/// Per-candidate time budgets resolved for one scenario
pub struct ProbeBudgets {
    pub per_nav: Duration,
    pub assertion: Duration,
}

/// Drives navigation and assertion over a scenario's candidate list
pub struct ProbeStrategy {
    navigator: Navigator,
    engine: AssertionEngine,
}

impl ProbeStrategy {
    pub fn new(base_url: &str, poll_interval: Duration) -> Self {
        Self {
            navigator: Navigator::new(base_url),
            engine: AssertionEngine::new(base_url, poll_interval),
        }
    }

    /// Probe the candidate paths until the predicate holds, the list is
    /// exhausted, or the deadline passes
    ///
    /// The deadline is checked before every navigation attempt and
    /// propagated into the assertion engine's polls, so a blown budget
    /// is detected mid-probe rather than at the end.
    pub async fn discover(
        &self,
        session: &mut dyn Session,
        scenario: &Scenario,
        budgets: &ProbeBudgets,
        deadline: Instant,
    ) -> (Vec<NavigationAttempt>, ProbeOutcome) {
        let mut attempts = Vec::with_capacity(scenario.candidate_paths.len());

        for path in &scenario.candidate_paths {
            let now = Instant::now();
            if now >= deadline {
                return (attempts, ProbeOutcome::BudgetExceeded);
            }

            let nav_timeout = cmp::min(budgets.per_nav, deadline - now);
            let attempt = self.navigator.open(session, path, nav_timeout).await;
            let succeeded = attempt.outcome == AttemptOutcome::Succeeded;
            attempts.push(attempt);

            if succeeded
                && self
                    .engine
                    .check(session, &scenario.predicate, budgets.assertion, deadline)
                    .await
            {
                return (attempts, ProbeOutcome::Satisfied);
            }
        }

        (attempts, ProbeOutcome::Exhausted)
    }
}
