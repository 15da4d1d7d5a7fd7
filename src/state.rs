use crate::config::Config;
use crate::spanner::SpannerClient;
use std::sync::Arc;

/// Shared application state
///
/// `client` is `None` when mock mode is forced, when the data source is
/// unconfigured, or when client initialization failed at startup. The
/// request handler treats all three the same way: serve the sample set.
#[derive(Clone)]
pub struct AppState {
    pub client: Option<SpannerClient>,
    pub config: Arc<Config>,
}
