//! Shared Error Types
//!
//! This module defines errors raised by the shared domain types: validating
//! request payloads and parsing enum values (module kinds, item kinds, roles)
//! out of URL segments or socket frames.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Payload validation failures
//! - `UnknownValue` - A string that does not name a known enum variant
//!
//! # Usage
//!
//! ```rust
//! use workhub::shared::error::SharedError;
//!
//! let error = SharedError::validation("name", "Name cannot be empty");
//! ```
use thiserror::Error;

/// Errors raised while validating or parsing shared types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// String did not match any known variant
    #[error("Unknown {kind}: '{value}'")]
    UnknownValue {
        /// What was being parsed (e.g. "item kind")
        kind: &'static str,
        /// The rejected input
        value: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown-value error
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownValue {
            kind,
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
