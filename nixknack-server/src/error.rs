//! Service error types

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Ownership, assignment or uniqueness violation
    #[error("{0}")]
    NotAllowed(String),

    /// Malformed or empty input
    #[error("{0}")]
    BadValues(String),

    #[error("You must be logged in!")]
    NotAuthenticated,

    #[error("Username or password is incorrect!")]
    InvalidCredentials,

    #[error(transparent)]
    Domain(#[from] nixknack_core::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadValues(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadValues(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAllowed(_) => StatusCode::FORBIDDEN,
            AppError::BadValues(_) | AppError::Domain(_) => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = json!({ "success": false, "msg": message });
        (status, axum::Json(body)).into_response()
    }
}
