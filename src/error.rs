use std::time::Duration;

use thiserror::Error;

/// Errors from the file-backed collaborators (slide store, user directory).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Underlying file system error
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// A metadata file exists but could not be parsed
    #[error("Corrupt metadata in {path}: {message}")]
    Corrupt { path: String, message: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Errors from a rate-limit counter store.
#[derive(Debug, Clone, Error)]
pub enum RateLimitError {
    /// The store did not answer within the configured bound
    #[error("Rate limit store timed out after {0:?}")]
    Timeout(Duration),

    /// The store answered with an error
    #[error("Rate limit store error: {0}")]
    Store(String),
}

/// Domain errors raised by pipeline modules and endpoint handlers.
///
/// Every variant maps to exactly one HTTP status in the response mapper
/// (see `server::response`). Messages are safe to show to callers, except
/// for `Internal`, whose detail is only logged.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No credential, or the credential is invalid/expired
    #[error("{0}")]
    Unauthorized(String),

    /// Valid credential, but the caller's groups are not permitted
    #[error("{0}")]
    Forbidden(String),

    /// Request parameters do not match the endpoint schema
    #[error("{message}")]
    InvalidRequest {
        message: String,
        /// Offending field names, in schema order
        fields: Vec<String>,
    },

    /// Slide, asset or thumbnail missing (distinguished by message)
    #[error("{0}")]
    NotFound(String),

    /// Caller exceeded the route's request budget
    #[error("Rate limit exceeded. Retry in {retry_after} second(s).")]
    RateLimitExceeded { retry_after: u64 },

    /// A bounded dependency (rate-limit store) timed out or failed
    #[error("Service temporarily unavailable: {0}")]
    Unavailable(String),

    /// Anything unexpected
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Build an `InvalidRequest` with a single free-form message and no field list.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidRequest {
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        ApiError::Unavailable(err.to_string())
    }
}
