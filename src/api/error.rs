//! API error handling.
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | `NotFound` | 404 | empty |
//! | `InvalidIdentifier` | 422 | empty |
//! | `ValidationFailed` | 422 | error document |
//! | `BadRequest` | 400 | `{code, message}` |
//! | `Conflict` | 409 | `{code, message}` |
//! | `Internal` | 500 | `{code, message}` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::infrastructure::RepositoryError;
use crate::validation::{ErrorDocument, PayloadError};

// =============================================================================
// API Error
// =============================================================================

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// Every non-success outcome of a task endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorResponse {
    /// The task does not exist.
    NotFound,
    /// The path identifier failed validation.
    InvalidIdentifier,
    /// The payload failed validation.
    ValidationFailed(ErrorDocument),
    /// The body is not a JSON object.
    BadRequest(ApiError),
    /// The identity is already taken.
    Conflict(ApiError),
    /// Anything else; details are logged, never returned.
    Internal(ApiError),
}

impl ApiErrorResponse {
    /// Creates a 400 Bad Request response.
    #[must_use]
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest(ApiError::new(code, message))
    }

    /// Creates a 409 Conflict response.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(ApiError::new("CONFLICT", message))
    }

    /// Creates a 500 Internal Server Error response.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal(ApiError::new("INTERNAL_ERROR", message))
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidIdentifier | Self::ValidationFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::NotFound | Self::InvalidIdentifier => status.into_response(),
            Self::ValidationFailed(document) => (status, Json(document)).into_response(),
            Self::BadRequest(error) | Self::Conflict(error) | Self::Internal(error) => {
                (status, Json(error)).into_response()
            }
        }
    }
}

impl From<RepositoryError> for ApiErrorResponse {
    fn from(error: RepositoryError) -> Self {
        match error {
            // An identifier of the other strategy cannot name a stored task.
            RepositoryError::IdentityMismatch { .. } => Self::NotFound,
            RepositoryError::Duplicate(id) => {
                Self::conflict(format!("A task with identifier {id} already exists"))
            }
            RepositoryError::DatabaseError(_) => {
                tracing::error!(%error, "Repository operation failed");
                Self::internal_error("An internal error occurred")
            }
        }
    }
}

impl From<PayloadError> for ApiErrorResponse {
    fn from(error: PayloadError) -> Self {
        Self::bad_request("INVALID_PAYLOAD", error.to_string())
    }
}

impl From<serde_json::Error> for ApiErrorResponse {
    fn from(error: serde_json::Error) -> Self {
        tracing::debug!(%error, "Rejected malformed JSON body");
        Self::bad_request("MALFORMED_JSON", "Request body is not valid JSON")
    }
}

// =============================================================================
// Tests
// =============================================================================
