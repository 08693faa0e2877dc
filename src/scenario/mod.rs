//! Scenario definitions
//!
//! Scenarios are declarative YAML documents: an ordered list of candidate
//! entry paths plus a success predicate and timeout budgets. This module
//! owns parsing and validation; execution lives in [`crate::runner`].

mod config;

pub use config::{HookStep, Predicate, Scenario, ScenarioFile};

use std::path::Path;

use crate::common::{Error, Result};

/// Load and validate a scenario file
pub fn load_file(path: &Path) -> Result<ScenarioFile> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::ScenarioRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let file: ScenarioFile =
        serde_yaml::from_str(&content).map_err(|e| Error::ScenarioParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    validate(&file)?;
    Ok(file)
}

/// Validate a parsed scenario file
///
/// Rejects empty ids, duplicate ids, empty candidate lists, candidate
/// paths that are not absolute, and zero timeouts.
pub fn validate(file: &ScenarioFile) -> Result<()> {
    if file.scenarios.is_empty() {
        return Err(Error::Config("scenario file defines no scenarios".to_string()));
    }

    let mut seen = std::collections::HashSet::new();
    for scenario in &file.scenarios {
        if scenario.id.trim().is_empty() {
            return Err(Error::scenario_invalid("", "empty scenario id"));
        }
        if !seen.insert(scenario.id.as_str()) {
            return Err(Error::scenario_invalid(&scenario.id, "duplicate scenario id"));
        }
        if scenario.candidate_paths.is_empty() {
            return Err(Error::scenario_invalid(
                &scenario.id,
                "candidate_paths must not be empty",
            ));
        }
        for path in &scenario.candidate_paths {
            if !path.starts_with('/') {
                return Err(Error::scenario_invalid(
                    &scenario.id,
                    format!("candidate path '{}' must start with '/'", path),
                ));
            }
        }
        for timeout in [
            scenario.per_nav_timeout_ms,
            scenario.overall_timeout_ms,
            scenario.assertion_timeout_ms,
        ]
        .into_iter()
        .flatten()
        {
            if timeout == 0 {
                return Err(Error::scenario_invalid(&scenario.id, "timeouts must be > 0"));
            }
        }
    }

    Ok(())
}
