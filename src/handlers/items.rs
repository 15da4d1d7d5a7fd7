use crate::error::{ApiError, ErrorResponse};
use crate::fallback::{resolve_items, ItemsSource};
use crate::models::Item;
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /api/myfunction handler - the items read endpoint
///
/// Always answers 200 with a JSON array of items. The fallback chain decides
/// whether those rows are live or the fixed sample set; the only
/// caller-visible failure is an unexpected internal error.
#[utoipa::path(
    get,
    path = routes::ITEMS,
    responses(
        (status = 200, description = "Items, live or mock", body = [Item]),
        (status = 500, description = "Unexpected internal failure", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn items_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Item>>), ApiError> {
    let source = resolve_items(&state).await;

    if let ItemsSource::Live(items) = &source {
        tracing::info!("Serving {} live items", items.len());
    }

    Ok((StatusCode::OK, Json(source.into_items())))
}
