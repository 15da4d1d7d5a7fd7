//! One-off provisioning: ensure the Spanner objects exist and seed the
//! sample items, or switch the service to local mock mode when the data
//! service is unreachable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::{Config, DatabaseTarget};
use crate::models::{sample_items, Item};
use crate::spanner::{ensure_database_objects, SpannerClient};

/// Default bound on the reachability probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Coordinates used when none are configured, for the zero-setup emulator
/// workflow.
fn default_target() -> DatabaseTarget {
    DatabaseTarget {
        project: "demo-project".to_string(),
        instance: "demo-instance".to_string(),
        database: "demo-database".to_string(),
    }
}

/// Options for a provisioning run, resolved from env config plus CLI flags.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Emulator endpoint to probe; `None` skips the probe (production)
    pub emulator_host: Option<String>,
    pub probe_timeout: Duration,
    /// Directory for the mock-mode status marker
    pub status_dir: PathBuf,
    /// Env file patched when switching to mock mode
    pub env_file: PathBuf,
}

/// Outcome of a provisioning run.
#[derive(Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Objects ensured; `seeded` of the sample items were upserted
    Seeded { seeded: usize },
    /// Data service unreachable; local mock mode was activated instead
    LocalMockMode,
}

/// Status marker recording that mock mode is active and which items it
/// serves.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockStatus {
    pub mock_data_enabled: bool,
    pub items: Vec<Item>,
}

/// Run the provisioning sequence: probe, ensure objects, seed items.
///
/// An unreachable emulator switches to local mock mode instead of failing.
/// Individual item failures are logged and skipped; the remaining items
/// still run.
pub async fn run(config: &Config, opts: &ProvisionOptions) -> Result<ProvisionOutcome> {
    if let Some(host) = &opts.emulator_host {
        if !probe_reachable(host, opts.probe_timeout).await {
            tracing::warn!(
                "Spanner emulator at {host} is unreachable; setting up local mock mode instead"
            );
            enable_local_mock_mode(opts)?;
            return Ok(ProvisionOutcome::LocalMockMode);
        }
        tracing::info!("Spanner emulator at {host} is reachable");
    }

    let target = config.database.clone().unwrap_or_else(|| {
        let target = default_target();
        tracing::info!(
            "Spanner coordinates not configured; using emulator defaults: {}",
            target.database_path()
        );
        target
    });

    ensure_database_objects(&target, opts.emulator_host.is_some()).await?;

    let client = SpannerClient::connect(&target).await?;

    let items = sample_items();
    let mut seeded = 0;
    for item in &items {
        match client.upsert_item(item).await {
            Ok(()) => {
                tracing::info!("Upserted item {}", item.id);
                seeded += 1;
            }
            Err(err) => {
                tracing::error!("Error upserting item {}: {err:#}", item.id);
            }
        }
    }

    tracing::info!("Setup complete: {seeded}/{} items seeded", items.len());
    Ok(ProvisionOutcome::Seeded { seeded })
}

/// Lightweight reachability probe: a plain TCP connect against the emulator
/// endpoint, bounded by `timeout`. The emulator speaks gRPC, so a connect
/// is the cheapest meaningful signal.
pub async fn probe_reachable(host: &str, timeout: Duration) -> bool {
    tracing::info!("Probing Spanner emulator at {host}");

    match tokio::time::timeout(timeout, TcpStream::connect(host)).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            tracing::warn!("Failed to connect to {host}: {err}");
            false
        }
        Err(_) => {
            tracing::warn!("Connection attempt to {host} timed out");
            false
        }
    }
}

/// Activate local mock mode: write the status marker, then patch the env
/// file so the request handler serves the sample set. A failed env-file
/// patch is logged but does not fail the run.
fn enable_local_mock_mode(opts: &ProvisionOptions) -> Result<()> {
    let status_path = write_status_file(&opts.status_dir)?;
    tracing::info!("Wrote mock status marker to {}", status_path.display());

    match force_mock_mode_in_env_file(&opts.env_file) {
        Ok(()) => tracing::info!("Patched {} to force mock mode", opts.env_file.display()),
        Err(err) => tracing::warn!("Could not update {}: {err:#}", opts.env_file.display()),
    }

    Ok(())
}

/// Write `status.json` under `dir`, recording that mock mode is active and
/// which items it serves. Returns the path written.
pub fn write_status_file(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let status = MockStatus {
        mock_data_enabled: true,
        items: sample_items(),
    };

    let path = dir.join("status.json");
    let contents =
        serde_json::to_string_pretty(&status).context("Failed to serialize mock status")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Set `USE_MOCK_DATA=true` in the env file: rewrite the line when the key
/// is present, append it otherwise, create the file when missing.
pub fn force_mock_mode_in_env_file(path: &Path) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("Failed to read {}", path.display())))
        }
    };

    let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();
    let mut replaced = false;
    for line in &mut lines {
        if line.trim_start().starts_with("USE_MOCK_DATA=") {
            *line = "USE_MOCK_DATA=true".to_string();
            replaced = true;
        }
    }
    if !replaced {
        lines.push("USE_MOCK_DATA=true".to_string());
    }

    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
