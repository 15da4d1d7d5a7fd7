use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use rust_spanner_items::config::Config;
use rust_spanner_items::provision::{self, ProvisionOptions, ProvisionOutcome};

/// One-off setup: ensure the Spanner objects exist and seed the sample
/// items, or switch the service to local mock mode when the emulator is
/// unreachable.
#[derive(Parser)]
#[command(name = "provision")]
#[command(about = "Provision the items database and seed sample data", long_about = None)]
struct Args {
    /// Emulator endpoint to probe and provision against
    /// (defaults to SPANNER_EMULATOR_HOST)
    #[arg(long)]
    emulator_host: Option<String>,

    /// Reachability probe timeout in seconds
    #[arg(long, default_value_t = provision::DEFAULT_PROBE_TIMEOUT.as_secs())]
    probe_timeout_secs: u64,

    /// Directory for the mock-mode status marker
    #[arg(long, default_value = "mock-data")]
    status_dir: PathBuf,

    /// Env file to patch when switching to mock mode
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if let Some(host) = &args.emulator_host {
        // The Spanner client routes through SPANNER_EMULATOR_HOST; keep it
        // consistent with the endpoint the probe targets.
        unsafe {
            std::env::set_var("SPANNER_EMULATOR_HOST", host);
        }
    }

    let config = Config::from_env()?;

    let opts = ProvisionOptions {
        emulator_host: args
            .emulator_host
            .or_else(|| config.spanner_emulator_host.clone()),
        probe_timeout: Duration::from_secs(args.probe_timeout_secs),
        status_dir: args.status_dir,
        env_file: args.env_file,
    };

    match provision::run(&config, &opts).await? {
        ProvisionOutcome::Seeded { seeded } => {
            tracing::info!("Provisioning finished: {seeded} items seeded");
        }
        ProvisionOutcome::LocalMockMode => {
            tracing::info!("Provisioning finished: local mock mode enabled");
        }
    }

    Ok(())
}
