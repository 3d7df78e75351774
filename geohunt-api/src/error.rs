//! Error Types for GeoHunt API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//! - Mapping from the engine's error taxonomy
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geohunt_core::{GeohuntError, ProgressError, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// No player identity on the request
    Unauthorized,

    /// Identity present but lacks the required role
    Forbidden,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    ValidationFailed,

    InvalidInput,

    MissingField,

    InvalidRange,

    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Referenced treasure is not in the catalog
    TreasureNotFound,

    /// Any other missing record
    EntityNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// The player already holds this treasure. Nothing changed.
    AlreadyUnlocked,

    /// Optimistic concurrency check failed
    ConcurrentModification,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    InternalError,

    /// Progress store is unreachable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::TreasureNotFound | ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            ErrorCode::AlreadyUnlocked | ErrorCode::ConcurrentModification => {
                StatusCode::CONFLICT
            }

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    pub fn treasure_not_found(treasure_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::TreasureNotFound,
            format!("Treasure {} not found", treasure_id),
        )
    }

    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    pub fn already_unlocked(treasure_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::AlreadyUnlocked,
            format!("Treasure {} is already unlocked", treasure_id),
        )
    }

    pub fn concurrent_modification(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConcurrentModification,
            format!("{} {} was modified by another request", entity_type, id),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<GeohuntError> for ApiError {
    fn from(err: GeohuntError) -> Self {
        match err {
            GeohuntError::Progress(ProgressError::TreasureNotFound { treasure_id }) => {
                ApiError::treasure_not_found(treasure_id)
            }
            GeohuntError::Progress(ProgressError::AlreadyUnlocked { treasure_id, .. }) => {
                ApiError::already_unlocked(treasure_id)
            }
            GeohuntError::Validation(err) => ApiError::validation_failed(err.to_string()),
            GeohuntError::Storage(StorageError::VersionConflict { player_id, .. }) => {
                ApiError::concurrent_modification("Progress", player_id)
            }
            GeohuntError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::entity_not_found(&format!("{:?}", entity_type), id)
            }
            GeohuntError::Storage(StorageError::Unavailable { reason }) => {
                tracing::error!(reason = %reason, "progress store unavailable");
                ApiError::service_unavailable("Progress store is unavailable")
            }
            other => {
                // Log the full error, return a generic one.
                tracing::error!(error = %other, "unhandled engine error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Malformed JSON documents, such as a catalog seed file.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
