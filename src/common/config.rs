//! Configuration file handling

use serde::Deserialize;
use std::path::Path;

use super::paths;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Target application settings
    #[serde(default)]
    pub target: TargetConfig,

    /// WebDriver settings
    #[serde(default)]
    pub driver: DriverConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Runner settings
    #[serde(default)]
    pub runner: RunnerSettings,
}

/// Target application settings
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    /// Base URL the candidate paths are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// WebDriver settings
#[derive(Debug, Deserialize, Clone)]
pub struct DriverConfig {
    /// WebDriver server endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Spawn the WebDriver binary when the endpoint is not reachable
    #[serde(default = "default_auto_launch")]
    pub auto_launch: bool,

    /// WebDriver binary to spawn (searched in PATH)
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Run the browser headless
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Browser window width
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Browser window height
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            auto_launch: default_auto_launch(),
            binary: default_binary(),
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9515".to_string()
}
fn default_auto_launch() -> bool {
    true
}
fn default_binary() -> String {
    "chromedriver".to_string()
}
fn default_headless() -> bool {
    true
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}

/// Timeout settings in milliseconds
///
/// These are the fallbacks for scenarios that do not set their own
/// budgets.
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Timeout for a single navigation attempt
    #[serde(default = "default_per_nav")]
    pub per_nav_ms: u64,

    /// Timeout for the assertion engine per candidate
    #[serde(default = "default_assertion")]
    pub assertion_ms: u64,

    /// Overall budget for one scenario
    #[serde(default = "default_overall")]
    pub overall_ms: u64,

    /// Interval between predicate polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            per_nav_ms: default_per_nav(),
            assertion_ms: default_assertion(),
            overall_ms: default_overall(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_per_nav() -> u64 {
    10_000
}
fn default_assertion() -> u64 {
    30_000
}
fn default_overall() -> u64 {
    120_000
}
fn default_poll_interval() -> u64 {
    500
}

/// Runner settings
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerSettings {
    /// Maximum number of scenarios running concurrently, each with its
    /// own browser session
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_max_concurrency() -> usize {
    1
}

impl Config {
    /// Load configuration
    ///
    /// Resolution order: explicit path, `webprobe.toml` in the working
    /// directory, the platform config file, built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file '{}' not found",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        if let Some(path) = paths::local_config_path() {
            return Self::from_file(&path);
        }

        if let Some(path) = paths::config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
