// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseError;

/// Body returned to the caller when the store fails.
///
/// List and create answer `[]`, update and delete answer `{"error": "Error"}`.
/// Existing clients depend on both shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureShape {
    EmptyArray,
    ErrorObject,
}

/// Every failure a duty route can produce, with its HTTP mapping
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 4xx raised while reading the body (413 too large, 415 media type)
    Rejected {
        status: StatusCode,
        message: String,
    },

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    StorageFailure {
        shape: FailureShape,
        source: DatabaseError,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn storage_failure(shape: FailureShape, source: DatabaseError) -> Self {
        ApiError::StorageFailure { shape, source }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StorageFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to JSON response body. Storage details never leave the server.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Rejected { message, .. } => json!({ "message": message }),
            ApiError::StorageFailure { shape: FailureShape::EmptyArray, .. } => json!([]),
            ApiError::StorageFailure { shape: FailureShape::ErrorObject, .. } => {
                json!({ "error": "Error" })
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Rejected { message, .. } => write!(f, "{}", message),
            ApiError::StorageFailure { source, .. } => write!(f, "storage failure: {}", source),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::StorageFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            ApiError::StorageFailure { source, .. } => {
                tracing::error!("Database error: {}", source);
            }
            ApiError::BadRequest(message) | ApiError::Rejected { message, .. } => {
                tracing::debug!("Rejected request: {}", message);
            }
            ApiError::NotFound(_) => {}
        }
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
