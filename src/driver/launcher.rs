//! WebDriver server spawning
//!
//! Checks whether the configured WebDriver endpoint is reachable and,
//! when allowed, spawns a locally installed server binary and waits for
//! it to accept commands.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};

use crate::common::config::DriverConfig;
use crate::common::{Error, Result};

/// Timeout for the spawned server to start accepting connections
const SPAWN_TIMEOUT_SECS: u64 = 10;

/// Timeout for a single /status probe
const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// Holds the spawned WebDriver process, if any. The process is killed
/// when the guard is dropped.
pub struct DriverGuard {
    child: Option<Child>,
}

impl DriverGuard {
    /// Whether this run spawned its own WebDriver server
    pub fn spawned(&self) -> bool {
        self.child.is_some()
    }
}

/// Ensure a WebDriver server is reachable, spawning one if necessary
pub async fn ensure_driver_running(config: &DriverConfig) -> Result<DriverGuard> {
    if status_ready(&config.endpoint).await {
        tracing::debug!(endpoint = %config.endpoint, "WebDriver already running");
        return Ok(DriverGuard { child: None });
    }

    if !config.auto_launch {
        return Err(Error::DriverUnreachable {
            endpoint: config.endpoint.clone(),
            reason: "not reachable and auto_launch is disabled".to_string(),
        });
    }

    let binary = which::which(&config.binary).map_err(|e| Error::DriverLaunch {
        binary: config.binary.clone(),
        reason: e.to_string(),
    })?;

    let port = endpoint_port(&config.endpoint).unwrap_or(9515);
    tracing::info!(binary = %binary.display(), port, "launching WebDriver server");

    let child = Command::new(&binary)
        .arg(format!("--port={}", port))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::DriverLaunch {
            binary: config.binary.clone(),
            reason: e.to_string(),
        })?;

    // Wait for the server to start accepting connections
    let deadline = Instant::now() + Duration::from_secs(SPAWN_TIMEOUT_SECS);
    loop {
        if Instant::now() >= deadline {
            return Err(Error::DriverStartTimeout(SPAWN_TIMEOUT_SECS));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;

        if status_ready(&config.endpoint).await {
            tracing::debug!("WebDriver server started successfully");
            return Ok(DriverGuard { child: Some(child) });
        }
    }
}

/// Probe the /status endpoint for readiness
pub async fn status_ready(endpoint: &str) -> bool {
    let url = format!("{}/status", endpoint.trim_end_matches('/'));

    let Ok(client) = reqwest::Client::builder().timeout(STATUS_TIMEOUT).build() else {
        return false;
    };

    match client.get(&url).send().await {
        Ok(response) => response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.pointer("/value/ready").and_then(|r| r.as_bool()))
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Extract the port from an endpoint URL
fn endpoint_port(endpoint: &str) -> Option<u16> {
    endpoint
        .trim_end_matches('/')
        .rsplit(':')
        .next()?
        .parse()
        .ok()
}
