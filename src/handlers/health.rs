use crate::error::{HealthResponse, UnhealthyResponse};
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /health handler - Health check endpoint
///
/// In mock mode there is no backing store to probe, so the service reports
/// healthy. With a live client, a trivial query verifies connectivity:
/// 200 OK when it answers, 503 Service Unavailable otherwise.
#[utoipa::path(
    get,
    path = routes::HEALTH,
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = UnhealthyResponse)
    ),
    tag = "health"
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<HealthResponse>), (StatusCode, Json<UnhealthyResponse>)> {
    let Some(client) = &state.client else {
        return Ok((
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy (mock data)".to_string(),
            }),
        ));
    };

    match client.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            Ok((
                StatusCode::OK,
                Json(HealthResponse {
                    status: "healthy".to_string(),
                }),
            ))
        }
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UnhealthyResponse {
                    status: "unhealthy".to_string(),
                    error: format!("Cannot connect to database: {}", e),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoint_healthy_in_mock_mode() {
        let config = Config {
            use_mock_data: true,
            spanner_emulator_host: None,
            database: None,
            service_port: 3000,
            service_host: "0.0.0.0".to_string(),
        };

        let app = crate::routes::router(AppState {
            client: None,
            config: Arc::new(config),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(crate::routes::HEALTH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let response_json: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert!(response_json.status.starts_with("healthy"));
    }
}
