//! Data-availability fallback policy.
//!
//! An ordered sequence of capability checks decides where the rows for a
//! read request come from. Every branch that cannot produce live rows
//! degrades to the fixed sample set; data-source failures never reach the
//! caller.

use crate::models::{sample_items, Item};
use crate::spanner::ReadError;
use crate::state::AppState;

/// Why the fixed sample set was served instead of live rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockReason {
    /// USE_MOCK_DATA forced it
    Forced,
    /// No data source configured, or the client failed to initialize
    Unconfigured,
    /// The database or table does not exist yet
    Missing,
    /// The live read failed
    QueryFailed,
}

/// Outcome of the source decision: live rows, or the mock set tagged with
/// the reason it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemsSource {
    Mock(MockReason),
    Live(Vec<Item>),
}

impl ItemsSource {
    /// The rows to serialize into the response.
    pub fn into_items(self) -> Vec<Item> {
        match self {
            ItemsSource::Mock(_) => sample_items(),
            ItemsSource::Live(items) => items,
        }
    }
}

/// Walk the fallback chain: forced mock mode, unconfigured data source,
/// then a live read whose failures all degrade to the mock set.
pub async fn resolve_items(state: &AppState) -> ItemsSource {
    if state.config.use_mock_data {
        tracing::info!("Using mock data mode as configured");
        return ItemsSource::Mock(MockReason::Forced);
    }

    let Some(client) = &state.client else {
        tracing::info!("No data source available; using mock data");
        return ItemsSource::Mock(MockReason::Unconfigured);
    };

    match client.list_items().await {
        Ok(items) => ItemsSource::Live(items),
        Err(ReadError::NotFound(message)) => {
            tracing::warn!("Items table not found ({message}); using mock data");
            ItemsSource::Mock(MockReason::Missing)
        }
        Err(err) => {
            tracing::error!("Error querying Spanner: {err}; using mock data");
            ItemsSource::Mock(MockReason::QueryFailed)
        }
    }
}
