/// Error types for the content index service
///
/// Core failures pass through unchanged; this layer only picks the HTTP status.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use content_index::IndexError;
use std::fmt;

/// Result type for content index service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Timestamp store (Redis) failed
    StoreUnavailable(String),

    /// Content listing or authorization lookup failed
    ContentSourceUnavailable(String),

    /// Missing or invalid credentials
    Unauthorized(String),

    /// Authenticated but lacking a capability
    Forbidden(String),

    /// Bad request
    BadRequest(String),

    /// Internal server error
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            AppError::ContentSourceUnavailable(msg) => {
                write!(f, "Content source unavailable: {}", msg)
            }
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::StoreUnavailable(_) | AppError::ContentSourceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            IndexError::ContentSourceUnavailable(msg) => AppError::ContentSourceUnavailable(msg),
            IndexError::Serialization(e) => AppError::StoreUnavailable(e.to_string()),
            IndexError::Configuration(msg) => AppError::Internal(msg),
        }
    }
}
