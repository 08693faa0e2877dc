//! Scenario execution
//!
//! Orchestrates navigator, probe strategy, and assertion engine for one
//! scenario, and runs suites of scenarios with bounded concurrency. The
//! browser session is always released on every exit path, and every
//! scenario produces a finalized run record; nothing a single scenario
//! does can abort the rest of the suite.

pub mod report;

pub use report::{FailureEntry, FailureReason, Report, ScenarioRun, Summary, Verdict};

use std::cmp;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tokio::process::Command as TokioCommand;
use tracing::{debug, error, info, warn};

use crate::common::config::Timeouts;
use crate::common::{Error, Result};
use crate::driver::Browser;
use crate::probe::{AttemptOutcome, NavigationAttempt, ProbeBudgets, ProbeOutcome, ProbeStrategy};
use crate::scenario::{HookStep, Scenario};

/// Options shared by every run in a suite
pub struct RunnerOptions {
    /// Base URL candidate paths are resolved against
    pub base_url: String,
    /// Timeout fallbacks for scenarios that do not set their own
    pub defaults: Timeouts,
    /// Maximum scenarios in flight at once, each with its own session
    pub max_concurrency: usize,
}

/// Executes scenarios against a browser
pub struct ScenarioRunner {
    browser: Arc<dyn Browser>,
    options: RunnerOptions,
}

impl ScenarioRunner {
    pub fn new(browser: Arc<dyn Browser>, options: RunnerOptions) -> Self {
        Self { browser, options }
    }

    /// Run a list of scenarios, preserving declaration order in the
    /// report regardless of completion order
    pub async fn run_suite(&self, scenarios: &[Scenario]) -> Report {
        info!("Running {} scenario(s)...", scenarios.len());
        let limit = cmp::max(1, self.options.max_concurrency);

        let mut indexed: Vec<(usize, ScenarioRun)> = stream::iter(scenarios.iter().enumerate())
            .map(|(index, scenario)| async move { (index, self.run_scenario(scenario).await) })
            .buffer_unordered(limit)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);

        let mut report = Report::new();
        for (_, run) in indexed {
            let reason = run
                .failure
                .as_ref()
                .map(FailureReason::to_string)
                .unwrap_or_default();
            match run.verdict {
                Verdict::Pass => info!("✓ {} ({} ms)", run.scenario_id, run.duration_ms),
                Verdict::Fail => error!("✗ {} - {}", run.scenario_id, reason),
                Verdict::Inconclusive => warn!("? {} - {}", run.scenario_id, reason),
            }
            report.add(run);
        }
        report
    }

    /// Run one scenario to a finalized, immutable record
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioRun {
        let started_at = Utc::now();
        let start = Instant::now();
        debug!(id = %scenario.id, "starting scenario");

        let finalize = |verdict: Verdict,
                        failure: Option<FailureReason>,
                        attempts: Vec<NavigationAttempt>,
                        last_page: Option<crate::driver::PageState>| ScenarioRun {
            scenario_id: scenario.id.clone(),
            verdict,
            failure,
            attempts,
            last_page,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if let Some(steps) = &scenario.setup {
            if let Err(e) = run_hooks(steps).await {
                self.run_teardown(scenario).await;
                return finalize(
                    Verdict::Fail,
                    Some(FailureReason::SetupFailed {
                        message: e.to_string(),
                    }),
                    Vec::new(),
                    None,
                );
            }
        }

        let mut session = match self.browser.new_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(id = %scenario.id, error = %e, "could not create browser session");
                self.run_teardown(scenario).await;
                return finalize(
                    Verdict::Inconclusive,
                    Some(FailureReason::SessionError {
                        message: e.to_string(),
                    }),
                    Vec::new(),
                    None,
                );
            }
        };

        let defaults = &self.options.defaults;
        let budgets = ProbeBudgets {
            per_nav: Duration::from_millis(
                scenario.per_nav_timeout_ms.unwrap_or(defaults.per_nav_ms),
            ),
            assertion: Duration::from_millis(
                scenario.assertion_timeout_ms.unwrap_or(defaults.assertion_ms),
            ),
        };
        let overall_ms = scenario.overall_timeout_ms.unwrap_or(defaults.overall_ms);
        let deadline = start + Duration::from_millis(overall_ms);

        let strategy = ProbeStrategy::new(
            &self.options.base_url,
            Duration::from_millis(defaults.poll_interval_ms),
        );
        let (attempts, outcome) = strategy
            .discover(session.as_mut(), scenario, &budgets, deadline)
            .await;

        // Diagnostics only make sense if some navigation landed
        let any_succeeded = attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::Succeeded);
        let last_page = match outcome {
            ProbeOutcome::Satisfied => None,
            _ if any_succeeded => session.page_state().await.ok(),
            _ => None,
        };

        if let Err(e) = session.close().await {
            warn!(id = %scenario.id, error = %e, "failed to close browser session");
        }
        self.run_teardown(scenario).await;

        let (verdict, failure) = match outcome {
            ProbeOutcome::Satisfied => (Verdict::Pass, None),
            ProbeOutcome::BudgetExceeded => (
                Verdict::Fail,
                Some(FailureReason::BudgetExceeded {
                    budget_ms: overall_ms,
                }),
            ),
            ProbeOutcome::Exhausted if any_succeeded => {
                (Verdict::Fail, Some(FailureReason::CandidatesExhausted))
            }
            ProbeOutcome::Exhausted => {
                let last_error = attempts
                    .iter()
                    .rev()
                    .find_map(|a| a.error.clone())
                    .unwrap_or_else(|| "no navigation succeeded".to_string());
                (
                    Verdict::Inconclusive,
                    Some(FailureReason::TargetUnreachable { last_error }),
                )
            }
        };

        finalize(verdict, failure, attempts, last_page)
    }

    async fn run_teardown(&self, scenario: &Scenario) {
        if let Some(steps) = &scenario.teardown {
            if let Err(e) = run_hooks(steps).await {
                warn!(id = %scenario.id, error = %e, "teardown step failed");
            }
        }
    }
}

/// Run setup/teardown shell steps sequentially, stopping at the first
/// failure
async fn run_hooks(steps: &[HookStep]) -> Result<()> {
    for step in steps {
        debug!(command = %step.shell, "running hook");
        let status = TokioCommand::new("sh")
            .arg("-c")
            .arg(&step.shell)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                Error::SetupCommand(format!("'{}' failed to execute: {}", step.shell, e))
            })?;

        if !status.success() {
            return Err(Error::SetupCommand(format!(
                "'{}' exited with code {:?}",
                step.shell,
                status.code()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{MockBrowser, MockPage};
    use crate::scenario::Predicate;
    use std::sync::atomic::Ordering;

    fn scenario(id: &str, paths: &[&str], predicate: Predicate) -> Scenario {
        Scenario {
            id: id.to_string(),
            description: None,
            tags: Vec::new(),
            setup: None,
            teardown: None,
            candidate_paths: paths.iter().map(|p| p.to_string()).collect(),
            predicate,
            per_nav_timeout_ms: Some(200),
            overall_timeout_ms: Some(2_000),
            assertion_timeout_ms: Some(100),
        }
    }

    fn text(value: &str) -> Predicate {
        Predicate::TextVisible {
            value: value.to_string(),
        }
    }

    fn fast_timeouts() -> Timeouts {
        Timeouts {
            per_nav_ms: 200,
            assertion_ms: 100,
            overall_ms: 2_000,
            poll_interval_ms: 10,
        }
    }

    fn runner(browser: MockBrowser) -> ScenarioRunner {
        ScenarioRunner::new(
            Arc::new(browser),
            RunnerOptions {
                base_url: "http://localhost:3000".to_string(),
                defaults: fast_timeouts(),
                max_concurrency: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_session_failure_is_inconclusive() {
        let runner = runner(MockBrowser::new().failing_sessions());
        let run = runner
            .run_scenario(&scenario("s", &["/login"], text("x")))
            .await;

        assert_eq!(run.verdict, Verdict::Inconclusive);
        assert!(matches!(run.failure, Some(FailureReason::SessionError { .. })));
        assert!(run.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_setup_failure_is_fail_without_session() {
        let browser = MockBrowser::new().with_page("/login", MockPage::with_text("x"));
        let counter = browser.session_counter();
        let runner = runner(browser);

        let mut s = scenario("s", &["/login"], text("x"));
        s.setup = Some(vec![HookStep {
            shell: "exit 3".to_string(),
        }]);

        let run = runner.run_scenario(&s).await;
        assert_eq!(run.verdict, Verdict::Fail);
        assert!(matches!(run.failure, Some(FailureReason::SetupFailed { .. })));
        // No session was ever created
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_released_on_pass_and_fail() {
        let browser = MockBrowser::new()
            .with_page("/pass", MockPage::with_text("Login Successful"))
            .with_page("/fail", MockPage::with_text("something else"));
        let counter = browser.session_counter();
        let runner = runner(browser);

        let passing = runner
            .run_scenario(&scenario("p", &["/pass"], text("Login Successful")))
            .await;
        assert_eq!(passing.verdict, Verdict::Pass);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let failing = runner
            .run_scenario(&scenario("f", &["/fail"], text("Login Successful")))
            .await;
        assert_eq!(failing.verdict, Verdict::Fail);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_page_diagnostics() {
        let browser =
            MockBrowser::new().with_page("/dash", MockPage::with_text("wrong dashboard copy"));
        let runner = runner(browser);

        let run = runner
            .run_scenario(&scenario("d", &["/dash"], text("Expected banner")))
            .await;

        assert_eq!(run.verdict, Verdict::Fail);
        let page = run.last_page.expect("diagnostics attached");
        assert!(page.excerpt.contains("wrong dashboard copy"));
    }

    #[tokio::test]
    async fn test_suite_preserves_declaration_order() {
        let browser = MockBrowser::new()
            .with_page("/a", MockPage::with_text("alpha"))
            .with_page("/b", MockPage::with_text("beta"));
        let runner = ScenarioRunner::new(
            Arc::new(browser),
            RunnerOptions {
                base_url: "http://localhost:3000".to_string(),
                defaults: fast_timeouts(),
                max_concurrency: 4,
            },
        );

        let scenarios = vec![
            scenario("first", &["/a"], text("alpha")),
            scenario("second", &["/b"], text("beta")),
            scenario("third", &["/a"], text("missing")),
        ];
        let report = runner.run_suite(&scenarios).await;

        let ids: Vec<_> = report.runs().iter().map(|r| r.scenario_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);

        let summary = report.summarize();
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
    }
}
