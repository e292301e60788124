//! API error handling
//!
//! Structured error responses with HTTP status codes and request tracking.

use crate::errors::GameError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (NOT_FOUND, INVALID_TRANSITION, CAPACITY_EXCEEDED, ...)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub request_id: String,
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        let (status, code) = match &err {
            GameError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            GameError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            GameError::CapacityExceeded(_) => (StatusCode::CONFLICT, "CAPACITY_EXCEEDED"),
            GameError::ChoiceNotAccepted { .. } => (StatusCode::BAD_REQUEST, "CHOICE_NOT_ACCEPTED"),
            GameError::InvalidStake(_) => (StatusCode::BAD_REQUEST, "INVALID_STAKE"),
            GameError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        Self {
            status,
            code,
            message: err.to_string(),
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.request_id, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: self.code.to_string(),
                message: self.message,
            },
        });
        (self.status, body).into_response()
    }
}
