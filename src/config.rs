use std::env;

use anyhow::{Context, Result};

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Force the fixed sample set regardless of data-source configuration
    pub use_mock_data: bool,
    pub spanner_emulator_host: Option<String>,
    /// `None` when the data source is unconfigured; the service then serves
    /// mock data
    pub database: Option<DatabaseTarget>,
    pub service_port: u16,
    pub service_host: String,
}

/// Coordinates of the Spanner database backing the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl DatabaseTarget {
    pub fn project_path(&self) -> String {
        format!("projects/{}", self.project)
    }

    pub fn instance_path(&self) -> String {
        format!("{}/instances/{}", self.project_path(), self.instance)
    }

    pub fn database_path(&self) -> String {
        format!("{}/databases/{}", self.instance_path(), self.database)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let use_mock_data = env::var("USE_MOCK_DATA")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let spanner_emulator_host = env::var("SPANNER_EMULATOR_HOST").ok();

        let project = env::var("SPANNER_PROJECT").ok();
        let instance = env::var("SPANNER_INSTANCE").ok();
        let database = env::var("SPANNER_DATABASE").ok();

        // All three coordinates are required to address a database; anything
        // less counts as unconfigured and the service falls back to mock data.
        let database = match (project, instance, database) {
            (Some(project), Some(instance), Some(database)) => Some(DatabaseTarget {
                project,
                instance,
                database,
            }),
            (None, None, None) => None,
            _ => {
                tracing::warn!(
                    "Partial Spanner configuration: SPANNER_PROJECT, SPANNER_INSTANCE and \
                     SPANNER_DATABASE must all be set. Treating the data source as unconfigured."
                );
                None
            }
        };

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Config {
            use_mock_data,
            spanner_emulator_host,
            database,
            service_port,
            service_host,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Mock data forced: {}", self.use_mock_data);
        tracing::info!("  Spanner emulator: {}",
            self.spanner_emulator_host.as_deref().unwrap_or("disabled (using production)"));
        match &self.database {
            Some(target) => tracing::info!("  Spanner database: {}", target.database_path()),
            None => tracing::info!("  Spanner database: unconfigured (serving mock data)"),
        }
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}
