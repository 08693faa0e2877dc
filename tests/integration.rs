//! End-to-end tests for the scenario runner
//!
//! Drives the full pipeline (runner -> strategy -> navigator ->
//! assertion engine -> report) against the scripted mock browser, and
//! checks the structural properties every run must satisfy.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use webprobe::common::config::Timeouts;
use webprobe::driver::mock::{MockBrowser, MockPage};
use webprobe::probe::AttemptOutcome;
use webprobe::runner::{FailureReason, Report, RunnerOptions, ScenarioRunner, Verdict};
use webprobe::scenario::{Predicate, Scenario};

const BASE: &str = "http://localhost:3000";

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
        overall_timeout_ms: Some(5_000),
        assertion_timeout_ms: Some(100),
    }
}

fn text(value: &str) -> Predicate {
    Predicate::TextVisible {
        value: value.to_string(),
    }
}

fn runner_for(browser: MockBrowser) -> ScenarioRunner {
    ScenarioRunner::new(
        Arc::new(browser),
        RunnerOptions {
            base_url: BASE.to_string(),
            defaults: Timeouts {
                per_nav_ms: 200,
                assertion_ms: 100,
                overall_ms: 5_000,
                poll_interval_ms: 10,
            },
            max_concurrency: 1,
        },
    )
}

#[tokio::test]
async fn pass_on_second_candidate_records_two_attempts() {
    // First path renders without the expected text; the second renders it.
    let browser = MockBrowser::new()
        .with_page("/login", MockPage::with_text("Please sign in"))
        .with_page("/auth/login", MockPage::with_text("Login Successful"));
    let runner = runner_for(browser);

    let run = runner
        .run_scenario(&scenario(
            "login",
            &["/login", "/auth/login"],
            text("Login Successful"),
        ))
        .await;

    assert_eq!(run.verdict, Verdict::Pass);
    assert_eq!(run.attempts.len(), 2);
    assert_eq!(run.attempts[1].outcome, AttemptOutcome::Succeeded);
    assert!(run.failure.is_none());
    assert!(run.last_page.is_none());
}

#[tokio::test]
async fn unreachable_target_is_inconclusive_with_one_errored_attempt() {
    let browser =
        MockBrowser::new().with_page("/unreachable", MockPage::erroring("connection refused"));
    let runner = runner_for(browser);

    let run = runner
        .run_scenario(&scenario("down", &["/unreachable"], text("anything")))
        .await;

    assert_eq!(run.verdict, Verdict::Inconclusive);
    assert_eq!(run.attempts.len(), 1);
    assert_eq!(run.attempts[0].outcome, AttemptOutcome::Errored);
    assert!(matches!(
        run.failure,
        Some(FailureReason::TargetUnreachable { .. })
    ));
}

#[tokio::test]
async fn exhausted_candidates_fail_with_all_attempts_recorded() {
    let browser = MockBrowser::new()
        .with_page("/a", MockPage::with_text("not it"))
        .with_page("/b", MockPage::erroring("boom"))
        .with_page("/c", MockPage::with_text("still not it"));
    let runner = runner_for(browser);

    let paths = ["/a", "/b", "/c"];
    let run = runner
        .run_scenario(&scenario("exhaust", &paths, text("Never rendered")))
        .await;

    assert_eq!(run.verdict, Verdict::Fail);
    assert!(matches!(run.failure, Some(FailureReason::CandidatesExhausted)));
    // Attempt count equals the candidate list length, outcomes recorded
    assert_eq!(run.attempts.len(), paths.len());
    assert_eq!(run.attempts[0].outcome, AttemptOutcome::Succeeded);
    assert_eq!(run.attempts[1].outcome, AttemptOutcome::Errored);
    assert_eq!(run.attempts[2].outcome, AttemptOutcome::Succeeded);
    // Diagnostics attached from the last page that rendered
    assert!(run.last_page.is_some());
}

#[tokio::test]
async fn attempt_count_stays_within_candidate_bounds() {
    let browser = MockBrowser::new()
        .with_page("/one", MockPage::with_text("Found it"))
        .with_page("/two", MockPage::with_text("unused"));
    let runner = runner_for(browser);

    for paths in [vec!["/one"], vec!["/one", "/two"], vec!["/two", "/one"]] {
        let refs: Vec<&str> = paths.iter().map(|s| *s).collect();
        let run = runner
            .run_scenario(&scenario("bounds", &refs, text("Found it")))
            .await;
        assert!(!run.attempts.is_empty());
        assert!(run.attempts.len() <= paths.len());
    }
}

#[tokio::test]
async fn verdicts_are_deterministic_across_repeated_runs() {
    let browser = MockBrowser::new()
        .with_page("/flap", MockPage::erroring("refused"))
        .with_page("/ok", MockPage::with_text("Stable content"));
    let runner = runner_for(browser);

    let probe = scenario("repeat", &["/flap", "/ok"], text("Stable content"));
    let first = runner.run_scenario(&probe).await;
    let second = runner.run_scenario(&probe).await;

    assert_eq!(first.verdict, second.verdict);
    assert_eq!(first.attempts.len(), second.attempts.len());
    let order = |run: &webprobe::runner::ScenarioRun| {
        run.attempts.iter().map(|a| a.path.clone()).collect::<Vec<_>>()
    };
    assert_eq!(order(&first), order(&second));
}

#[tokio::test]
async fn budget_exceeded_finalizes_fail_with_partial_attempts() {
    let browser = MockBrowser::new()
        .with_page("/a", MockPage::with_text("nope"))
        .with_page("/b", MockPage::with_text("nope"))
        .with_page("/c", MockPage::with_text("nope"));
    let runner = runner_for(browser);

    let mut probe = scenario("budget", &["/a", "/b", "/c"], text("Absent"));
    // Overall budget only covers roughly one candidate's assertion window
    probe.overall_timeout_ms = Some(60);
    probe.assertion_timeout_ms = Some(50);

    let run = runner.run_scenario(&probe).await;

    assert_eq!(run.verdict, Verdict::Fail);
    assert!(matches!(
        run.failure,
        Some(FailureReason::BudgetExceeded { budget_ms: 60 })
    ));
    assert!(!run.attempts.is_empty());
    assert!(run.attempts.len() < 3);
}

#[tokio::test]
async fn predicate_satisfied_on_later_poll_still_passes() {
    let browser = MockBrowser::new()
        .with_page("/slow", MockPage::text_after_polls("Order Delivered Successfully", 4));
    let runner = runner_for(browser);

    let mut probe = scenario("slow-render", &["/slow"], text("Order Delivered Successfully"));
    probe.assertion_timeout_ms = Some(1_000);

    let run = runner.run_scenario(&probe).await;
    assert_eq!(run.verdict, Verdict::Pass);
}

#[tokio::test]
async fn session_failure_leaves_other_scenarios_untouched() {
    // A browser that refuses sessions makes every scenario inconclusive,
    // but the suite still reports each one.
    let runner = runner_for(MockBrowser::new().failing_sessions());

    let scenarios = vec![
        scenario("one", &["/a"], text("x")),
        scenario("two", &["/b"], text("y")),
    ];
    let report = runner.run_suite(&scenarios).await;

    assert_eq!(report.runs().len(), 2);
    for run in report.runs() {
        assert_eq!(run.verdict, Verdict::Inconclusive);
        assert!(matches!(run.failure, Some(FailureReason::SessionError { .. })));
        assert!(run.attempts.is_empty());
    }
}

#[tokio::test]
async fn mixed_suite_summary_matches_spec_counts() {
    let browser = MockBrowser::new()
        .with_page("/pass", MockPage::with_text("Login Successful"))
        .with_page("/fail", MockPage::with_text("wrong copy"))
        .with_page("/dead", MockPage::erroring("refused"));
    let runner = runner_for(browser);

    let scenarios = vec![
        scenario("passing", &["/pass"], text("Login Successful")),
        scenario("failing", &["/fail"], text("Login Successful")),
        scenario("dead", &["/dead"], text("Login Successful")),
    ];
    let report = runner.run_suite(&scenarios).await;

    let summary = report.summarize();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.inconclusive, 1);

    let failing_ids: Vec<_> = summary
        .failures
        .iter()
        .map(|f| f.scenario_id.as_str())
        .collect();
    assert_eq!(failing_ids, vec!["failing", "dead"]);
    assert!(!report.all_passed());
}

#[tokio::test]
async fn every_session_is_released_across_a_suite() {
    let browser = MockBrowser::new()
        .with_page("/pass", MockPage::with_text("ok"))
        .with_page("/fail", MockPage::with_text("nope"))
        .with_page("/dead", MockPage::erroring("refused"));
    let counter = browser.session_counter();

    let runner = ScenarioRunner::new(
        Arc::new(browser),
        RunnerOptions {
            base_url: BASE.to_string(),
            defaults: Timeouts {
                per_nav_ms: 200,
                assertion_ms: 50,
                overall_ms: 5_000,
                poll_interval_ms: 10,
            },
            max_concurrency: 3,
        },
    );

    let scenarios = vec![
        scenario("pass", &["/pass"], text("ok")),
        scenario("fail", &["/fail"], text("ok")),
        scenario("dead", &["/dead"], text("ok")),
    ];
    let report = runner.run_suite(&scenarios).await;

    assert_eq!(report.runs().len(), 3);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn api_response_predicate_passes_through_the_full_pipeline() {
    let browser = MockBrowser::new()
        .with_page("/admin", MockPage::with_text("Audit dashboard"))
        .with_api("/api/audit-logs", 200, r#"[{"action":"critical_action"}]"#);
    let runner = runner_for(browser);

    let run = runner
        .run_scenario(&scenario(
            "audit",
            &["/admin"],
            Predicate::ApiResponse {
                path: "/api/audit-logs".to_string(),
                status: Some(200),
                body_contains: Some("critical_action".to_string()),
            },
        ))
        .await;

    assert_eq!(run.verdict, Verdict::Pass);
}

#[tokio::test]
async fn report_can_be_rebuilt_from_its_json() {
    let browser = MockBrowser::new().with_page("/pass", MockPage::with_text("ok"));
    let runner = runner_for(browser);

    let run = runner
        .run_scenario(&scenario("round", &["/pass"], text("ok")))
        .await;

    let mut report = Report::new();
    report.add(run);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.write_json(&path).unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["summary"]["passed"], 1);
    assert_eq!(document["runs"][0]["verdict"], "pass");
}
