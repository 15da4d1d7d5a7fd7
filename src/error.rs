use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Body sent to callers for any unexpected internal failure. The underlying
/// error is logged, never put on the wire.
pub const INTERNAL_ERROR_BODY: &str = "An error occurred while processing your request.";

/// Custom error type for API endpoints
///
/// Data-source failures never reach this type: the fallback chain converts
/// them into the mock response. What remains is the unexpected failure while
/// assembling a response, which maps to a generic 500.
#[derive(Debug)]
pub enum ApiError {
    /// Unexpected failure while processing a request
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Internal(err) => {
                tracing::error!("Error processing request: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: INTERNAL_ERROR_BODY.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_internal_error_yields_generic_500() {
        let error = ApiError::Internal(anyhow::anyhow!("connection pool exhausted"));

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();

        // The caller sees the fixed message, not the underlying error
        assert_eq!(parsed.error, INTERNAL_ERROR_BODY);
        assert!(!parsed.error.contains("connection pool"));
    }
}
