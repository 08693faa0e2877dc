//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenario files.

use serde::{Deserialize, Serialize};

/// A scenario file: an optional base URL override plus the scenarios it
/// defines
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioFile {
    /// Base URL override for every scenario in this file
    #[serde(default)]
    pub base_url: Option<String>,

    /// The scenarios to run, in declaration order
    pub scenarios: Vec<Scenario>,
}

/// A declarative description of one end-to-end check: where to navigate
/// and what must become true
#[derive(Deserialize, Debug, Clone)]
pub struct Scenario {
    /// Unique identifier of the scenario
    pub id: String,

    /// Optional description of what the scenario verifies
    #[serde(default)]
    pub description: Option<String>,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Optional setup steps to run before the scenario (e.g., seeding)
    #[serde(default)]
    pub setup: Option<Vec<HookStep>>,

    /// Optional teardown steps, run best-effort after the scenario
    #[serde(default)]
    pub teardown: Option<Vec<HookStep>>,

    /// Candidate entry paths, tried strictly in this order
    pub candidate_paths: Vec<String>,

    /// The success predicate evaluated after each successful navigation
    pub predicate: Predicate,

    /// Timeout for a single navigation attempt (milliseconds)
    #[serde(default)]
    pub per_nav_timeout_ms: Option<u64>,

    /// Overall budget for the whole scenario (milliseconds)
    #[serde(default)]
    pub overall_timeout_ms: Option<u64>,

    /// Timeout for the assertion engine per candidate (milliseconds)
    #[serde(default)]
    pub assertion_timeout_ms: Option<u64>,
}

/// A setup or teardown step executed through the shell
#[derive(Deserialize, Debug, Clone)]
pub struct HookStep {
    /// Shell command to execute
    pub shell: String,
}

/// A boolean condition evaluated against observable page state
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// A text fragment is visible on the page or in one of its frames
    TextVisible {
        /// Substring matched against the rendered text
        value: String,
    },

    /// An element matching a CSS selector is visible
    ElementVisible {
        /// CSS selector
        value: String,
    },

    /// An HTTP endpoint of the target responds as expected
    ApiResponse {
        /// Path resolved against the base URL
        path: String,
        /// Expected status code; any success status when omitted
        #[serde(default)]
        status: Option<u16>,
        /// Substring expected in the response body
        #[serde(default)]
        body_contains: Option<String>,
    },
}

impl Predicate {
    /// Short human-readable form for listings and logs
    pub fn describe(&self) -> String {
        match self {
            Predicate::TextVisible { value } => format!("text-visible({:?})", value),
            Predicate::ElementVisible { value } => format!("element-visible({:?})", value),
            Predicate::ApiResponse { path, status, .. } => match status {
                Some(code) => format!("api-response({} -> {})", path, code),
                None => format!("api-response({})", path),
            },
        }
    }
}
