use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use seoforge_admission::RateLimited;
use seoforge_core::SeoforgeError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    RateLimited { retry_after_seconds: u64 },
    Internal(String),
}

impl From<SeoforgeError> for ApiError {
    fn from(e: SeoforgeError) -> Self {
        match e {
            SeoforgeError::Validation(msg) => ApiError::Validation(msg),
            SeoforgeError::NotFound(msg) => ApiError::NotFound(msg),
            SeoforgeError::RateLimited { retry_after_seconds } => {
                ApiError::RateLimited { retry_after_seconds }
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RateLimited> for ApiError {
    fn from(e: RateLimited) -> Self {
        ApiError::RateLimited {
            retry_after_seconds: e.retry_after_seconds,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, retry_after) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::RateLimited { retry_after_seconds } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
                Some(retry_after_seconds),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error,
                retry_after_seconds: retry_after,
            }),
        )
            .into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}
