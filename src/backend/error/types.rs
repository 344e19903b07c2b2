/**
 * Backend Error Types
 *
 * This module defines the single error type used by services, HTTP handlers
 * and socket acknowledgements. Every variant maps to one HTTP status code.
 *
 * # Error Categories
 *
 * - `NotFound` - A referenced document does not exist (404)
 * - `Forbidden` - The caller is not allowed to perform the action (403)
 * - `Unauthorized` - Missing or invalid credentials (401)
 * - `Conflict` - Uniqueness violation such as a duplicate email (409)
 * - `SharedError` - Payload validation / parsing failures (400)
 * - `StoreError` - Document store failures (500)
 * - `HandlerError` - Anything else with an explicit status
 */

use thiserror::Error;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Referenced document does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Document kind, e.g. "board"
        entity: &'static str,
        id: Uuid,
    },

    /// Caller lacks the required role
    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
    },

    /// Missing or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    /// Uniqueness conflict
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Validation or parsing error from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Document store failure
    #[error(transparent)]
    StoreError(#[from] StoreError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for a validation failure on `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SharedError(SharedError::validation(field, message))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::UnknownValue { .. } => StatusCode::BAD_REQUEST,
            },
            Self::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    ///
    /// Store and serialization failures are reported generically; the
    /// detail goes to the log instead.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StoreError(_) | Self::SerializationError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
