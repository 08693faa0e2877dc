//! Probe engine
//!
//! Navigation, predicate polling, and the ordered candidate-path
//! strategy that ties them together for one scenario.

pub mod assertion;
pub mod navigator;
pub mod strategy;

pub use assertion::AssertionEngine;
pub use navigator::Navigator;
pub use strategy::{ProbeBudgets, ProbeStrategy};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal classification of one navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    TimedOut,
    Errored,
}

/// Record of one navigation attempt within a scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationAttempt {
    /// Candidate path attempted
    pub path: String,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// How a probe over a scenario's candidate list ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The predicate was satisfied
    Satisfied,
    /// Every candidate was tried without satisfying the predicate
    Exhausted,
    /// The scenario's overall budget ran out mid-probe
    BudgetExceeded,
}

/// Resolve a candidate path against the base URL
pub(crate) fn resolve_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
