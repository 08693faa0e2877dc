//! CLI command definitions
//!
//! Defines the clap commands for the probe runner CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenario files against the target application
    Run {
        /// Scenario YAML file(s)
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Override the target base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Override the WebDriver endpoint
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Maximum scenarios to run concurrently
        #[arg(long)]
        concurrency: Option<usize>,

        /// Only run scenarios carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Write the full report as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Configuration file (default: webprobe.toml, then user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Parse and validate scenario files without running them
    Validate {
        /// Scenario YAML file(s)
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,
    },

    /// List the scenarios defined in the given files
    List {
        /// Scenario YAML file(s)
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,
    },

    /// Check that the WebDriver endpoint is reachable
    Check {
        /// Override the WebDriver endpoint
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Configuration file (default: webprobe.toml, then user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
