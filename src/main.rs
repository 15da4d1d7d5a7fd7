use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;

use rust_spanner_items::config::Config;
use rust_spanner_items::routes;
use rust_spanner_items::spanner::SpannerClient;
use rust_spanner_items::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("rust-spanner-items starting");

    let config = Config::from_env()?;
    config.log_startup();

    let client = init_client(&config).await;
    let config = Arc::new(config);

    let state = AppState {
        client,
        config: config.clone(),
    };

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Listening on {addr}");
    axum::serve(listener, routes::router(state))
        .await
        .context("Server error")?;

    Ok(())
}

/// Initialize the Spanner client unless the fallback chain rules it out up
/// front. Initialization failure is not fatal: the handler degrades to the
/// sample set.
async fn init_client(config: &Config) -> Option<SpannerClient> {
    if config.use_mock_data {
        tracing::info!("Mock data mode forced; skipping Spanner client initialization");
        return None;
    }

    let Some(target) = &config.database else {
        tracing::warn!("Spanner database is not configured; mock data will be served");
        return None;
    };

    if let Some(host) = &config.spanner_emulator_host {
        tracing::info!("Using Spanner emulator at {host}");
    }

    match SpannerClient::connect(target).await {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::warn!("Failed to initialize Spanner client: {err:#}; mock data will be served");
            None
        }
    }
}
