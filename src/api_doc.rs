use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::Item;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rust-spanner-items API",
        version = "1.0.0",
        description = "A small items API backed by Cloud Spanner, with a mock-data fallback"
    ),
    paths(
        handlers::health::health_handler,
        handlers::items::items_handler
    ),
    components(
        schemas(
            Item,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "items", description = "Item read operations")
    )
)]
pub struct ApiDoc;
