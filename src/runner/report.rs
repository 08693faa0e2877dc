//! Report accumulation
//!
//! Collects finalized scenario runs and produces the summary. Pure
//! accumulation; printing and exit codes live in the CLI layer.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::driver::PageState;
use crate::probe::NavigationAttempt;

/// Final classification of a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Inconclusive,
}

/// Why a scenario did not pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Every candidate was tried; at least one navigation succeeded but
    /// the predicate never held
    CandidatesExhausted,
    /// The overall scenario budget ran out mid-probe
    BudgetExceeded { budget_ms: u64 },
    /// No browser session could be created
    SessionError { message: String },
    /// No candidate navigation ever succeeded
    TargetUnreachable { last_error: String },
    /// A setup hook failed before probing started
    SetupFailed { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::CandidatesExhausted => {
                write!(f, "candidate paths exhausted without satisfying the predicate")
            }
            FailureReason::BudgetExceeded { budget_ms } => {
                write!(f, "overall budget of {} ms exceeded", budget_ms)
            }
            FailureReason::SessionError { message } => {
                write!(f, "browser session could not be created: {}", message)
            }
            FailureReason::TargetUnreachable { last_error } => {
                write!(f, "no candidate navigation succeeded: {}", last_error)
            }
            FailureReason::SetupFailed { message } => write!(f, "setup failed: {}", message),
        }
    }
}

/// One finalized scenario run. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub scenario_id: String,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    pub attempts: Vec<NavigationAttempt>,
    /// Last observed page state, attached to failed runs for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<PageState>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScenarioRun {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Aggregate counts plus the failing entries
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub inconclusive: usize,
    pub failures: Vec<FailureEntry>,
}

/// One failing or inconclusive scenario in the summary
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub scenario_id: String,
    pub reason: String,
    pub attempts: usize,
}

/// Ordered collection of scenario runs
#[derive(Debug, Default)]
pub struct Report {
    runs: Vec<ScenarioRun>,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    runs: &'a [ScenarioRun],
    summary: Summary,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, run: ScenarioRun) {
        self.runs.push(run);
    }

    pub fn runs(&self) -> &[ScenarioRun] {
        &self.runs
    }

    pub fn all_passed(&self) -> bool {
        self.runs.iter().all(ScenarioRun::passed)
    }

    pub fn summarize(&self) -> Summary {
        let mut passed = 0;
        let mut failed = 0;
        let mut inconclusive = 0;
        let mut failures = Vec::new();

        for run in &self.runs {
            match run.verdict {
                Verdict::Pass => passed += 1,
                Verdict::Fail => failed += 1,
                Verdict::Inconclusive => inconclusive += 1,
            }
            if run.verdict != Verdict::Pass {
                failures.push(FailureEntry {
                    scenario_id: run.scenario_id.clone(),
                    reason: run
                        .failure
                        .as_ref()
                        .map(FailureReason::to_string)
                        .unwrap_or_else(|| "unknown".to_string()),
                    attempts: run.attempts.len(),
                });
            }
        }

        Summary {
            total: self.runs.len(),
            passed,
            failed,
            inconclusive,
            failures,
        }
    }

    /// Write runs and summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let document = ReportDocument {
            runs: &self.runs,
            summary: self.summarize(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
