//! CLI command handling
//!
//! Dispatches CLI commands and formats terminal output. Exit codes:
//! 0 when every scenario passed, 1 when any failed or was inconclusive,
//! 2 on configuration or environment errors.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::Result;
use crate::driver::launcher;
use crate::driver::webdriver::WebDriverBrowser;
use crate::runner::{Report, RunnerOptions, ScenarioRunner, Verdict};
use crate::scenario::{self, ScenarioFile};

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            scenarios,
            base_url,
            webdriver_url,
            concurrency,
            tag,
            json,
            config,
        } => {
            run(
                scenarios,
                base_url,
                webdriver_url,
                concurrency,
                tag,
                json,
                config,
            )
            .await
        }

        Commands::Validate { scenarios } => {
            for path in &scenarios {
                let file = scenario::load_file(path)?;
                println!(
                    "{} {} ({} scenario(s))",
                    "✓".green(),
                    path.display(),
                    file.scenarios.len()
                );
            }
            Ok(0)
        }

        Commands::List { scenarios } => {
            for path in &scenarios {
                let file = scenario::load_file(path)?;
                println!("{}", path.display().to_string().bold());
                for scenario in &file.scenarios {
                    let tags = if scenario.tags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", scenario.tags.join(", "))
                    };
                    println!(
                        "  {}{} - {} candidate(s), {}",
                        scenario.id,
                        tags.dimmed(),
                        scenario.candidate_paths.len(),
                        scenario.predicate.describe().dimmed()
                    );
                }
            }
            Ok(0)
        }

        Commands::Check {
            webdriver_url,
            config,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(endpoint) = webdriver_url {
                config.driver.endpoint = endpoint;
            }

            if launcher::status_ready(&config.driver.endpoint).await {
                println!("WebDriver: {} at {}", "ready".green(), config.driver.endpoint);
                Ok(0)
            } else {
                println!(
                    "WebDriver: {} at {}",
                    "not reachable".red(),
                    config.driver.endpoint
                );
                Ok(1)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run(
    scenario_paths: Vec<PathBuf>,
    base_url: Option<String>,
    webdriver_url: Option<String>,
    concurrency: Option<usize>,
    tag: Option<String>,
    json: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<i32> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(endpoint) = webdriver_url {
        config.driver.endpoint = endpoint;
    }
    if let Some(limit) = concurrency {
        config.runner.max_concurrency = limit;
    }

    // Load every file up front so a bad file fails before any browser
    // work starts
    let mut sets: Vec<ScenarioFile> = Vec::new();
    for path in &scenario_paths {
        sets.push(scenario::load_file(path)?);
    }

    if let Some(tag) = &tag {
        for set in &mut sets {
            set.scenarios.retain(|s| s.tags.contains(tag));
        }
    }

    let total: usize = sets.iter().map(|s| s.scenarios.len()).sum();
    if total == 0 {
        println!("No scenarios to run");
        return Ok(0);
    }

    // Guard keeps a spawned WebDriver server alive until the run ends
    let _driver = launcher::ensure_driver_running(&config.driver).await?;
    let browser = Arc::new(WebDriverBrowser::new(&config.driver)?);

    let mut report = Report::new();
    for set in sets {
        let base = base_url
            .clone()
            .or_else(|| set.base_url.clone())
            .unwrap_or_else(|| config.target.base_url.clone());

        let runner = ScenarioRunner::new(
            browser.clone(),
            RunnerOptions {
                base_url: base,
                defaults: config.timeouts.clone(),
                max_concurrency: config.runner.max_concurrency,
            },
        );

        for run in runner.run_suite(&set.scenarios).await.runs() {
            report.add(run.clone());
        }
    }

    print_report(&report);

    if let Some(path) = json {
        report.write_json(&path)?;
        println!("Report written to {}", path.display());
    }

    Ok(if report.all_passed() { 0 } else { 1 })
}

/// Print the report summary to the terminal
fn print_report(report: &Report) {
    println!();
    for run in report.runs() {
        match run.verdict {
            Verdict::Pass => {
                println!(
                    "  {} {} {}",
                    "✓".green(),
                    run.scenario_id,
                    format!("({} ms, {} attempt(s))", run.duration_ms, run.attempts.len())
                        .dimmed()
                );
            }
            Verdict::Fail => {
                print_failure(run, "✗".red());
            }
            Verdict::Inconclusive => {
                print_failure(run, "?".yellow());
            }
        }
    }

    let summary = report.summarize();
    let headline = format!(
        "{} total, {} passed, {} failed, {} inconclusive",
        summary.total, summary.passed, summary.failed, summary.inconclusive
    );
    println!();
    if report.all_passed() {
        println!("{} {}", "All scenarios passed".green().bold(), headline.dimmed());
    } else {
        println!("{} {}", "Scenarios failed".red().bold(), headline.dimmed());
    }
}

fn print_failure(run: &crate::runner::ScenarioRun, marker: colored::ColoredString) {
    let reason = run
        .failure
        .as_ref()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("  {} {} - {}", marker, run.scenario_id, reason);

    for attempt in &run.attempts {
        let detail = attempt
            .error
            .as_deref()
            .map(|e| format!(" ({})", e))
            .unwrap_or_default();
        println!(
            "      {} {:?}{}",
            attempt.path.dimmed(),
            attempt.outcome,
            detail.dimmed()
        );
    }
    if let Some(page) = &run.last_page {
        println!(
            "      last page: {} {}",
            page.url.dimmed(),
            format!("{:?}", page.excerpt).dimmed()
        );
    }
}
