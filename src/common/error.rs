//! Error types for the probe runner
//!
//! Error messages are designed to be actionable: they name the resource
//! that failed and, where possible, how to fix the environment.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the probe runner
#[derive(Error, Debug)]
pub enum Error {
    // === Session Errors ===
    #[error("Failed to create browser session: {0}")]
    SessionCreate(String),

    #[error("Failed to close browser session: {0}")]
    SessionClose(String),

    #[error("WebDriver endpoint '{endpoint}' not reachable: {reason}")]
    DriverUnreachable { endpoint: String, reason: String },

    #[error("Failed to launch WebDriver binary '{binary}': {reason}")]
    DriverLaunch { binary: String, reason: String },

    #[error("WebDriver did not become ready within {0} seconds")]
    DriverStartTimeout(u64),

    // === Navigation Errors ===
    #[error("Navigation to '{url}' failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Navigation to '{url}' timed out after {timeout_ms} ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    // === Protocol Errors ===
    #[error("WebDriver protocol error '{kind}': {message}")]
    WebDriver { kind: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Scenario Errors ===
    #[error("Failed to read scenario file '{path}': {reason}")]
    ScenarioRead { path: String, reason: String },

    #[error("Failed to parse scenario file '{path}': {reason}")]
    ScenarioParse { path: String, reason: String },

    #[error("Invalid scenario '{id}': {reason}")]
    ScenarioInvalid { id: String, reason: String },

    #[error("Setup command failed: {0}")]
    SetupCommand(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a navigation error for a URL
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a WebDriver protocol error
    pub fn webdriver(kind: &str, message: &str) -> Self {
        Self::WebDriver {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a scenario validation error
    pub fn scenario_invalid(id: &str, reason: impl ToString) -> Self {
        Self::ScenarioInvalid {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error represents a navigation timeout rather than a
    /// hard navigation failure. The probe strategy records the two as
    /// different attempt outcomes.
    pub fn is_navigation_timeout(&self) -> bool {
        matches!(self, Error::NavigationTimeout { .. })
    }
}
