//! Mapping of pipeline results onto HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::pipeline::ApiResponse;

/// JSON error body returned for all API errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Offending request fields, for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
            fields: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            status: Some(status.as_u16()),
            ..Self::new(error, message)
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

impl ApiError {
    /// HTTP status and error type identifier.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            // Group rejections keep the 401 status; the error type tells them apart.
            ApiError::Forbidden(_) => (StatusCode::UNAUTHORIZED, "forbidden"),
            ApiError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::RateLimitExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// Convert ApiError to HTTP response.
///
/// 5xx are logged at ERROR with their detail, which is never sent to the
/// caller. 404 is logged at DEBUG, other 4xx at WARN.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                detail
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                detail
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                detail
            );
        }

        let body = match self {
            ApiError::InvalidRequest { message, fields } => {
                let body = ErrorResponse::with_status(error_type, message, status);
                if fields.is_empty() {
                    body
                } else {
                    body.with_fields(fields)
                }
            }
            ApiError::Unavailable(_) => ErrorResponse::with_status(
                error_type,
                "Service temporarily unavailable.",
                status,
            ),
            ApiError::Internal(_) => {
                ErrorResponse::with_status(error_type, "Internal server error.", status)
            }
            ApiError::RateLimitExceeded { retry_after } => {
                let body = ErrorResponse::with_status(error_type, detail, status);
                let mut response = (status, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                return response;
            }
            ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message) => {
                ErrorResponse::with_status(error_type, message, status)
            }
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Json(value) => (StatusCode::OK, Json(value)).into_response(),
            ApiResponse::File {
                body,
                content_type,
                cache_control,
            } => {
                let mut response = (StatusCode::OK, body).into_response();
                let headers = response.headers_mut();
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_str(&content_type)
                        .unwrap_or(HeaderValue::from_static("application/octet-stream")),
                );
                if let Some(value) = cache_control.and_then(|v| HeaderValue::from_str(&v).ok()) {
                    headers.insert(header::CACHE_CONTROL, value);
                }
                response
            }
        }
    }
}
