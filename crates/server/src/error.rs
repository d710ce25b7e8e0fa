//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Error bodies are JSON: `{"detail": "..."}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::LoyaltyError;

/// Application-level error type for the loyalty server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Loyalty operation failed.
    #[error("Loyalty error: {0}")]
    Loyalty(#[from] LoyaltyError),

    /// Request body was not valid JSON for the endpoint.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Loyalty(err) => match err {
                LoyaltyError::Embedding(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
                LoyaltyError::Embedding(_) => StatusCode::INTERNAL_SERVER_ERROR,
                LoyaltyError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
                LoyaltyError::Repository(e) => repository_status(e),
            },
            Self::InvalidBody(rejection) => rejection.status(),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let detail = match &self {
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::Loyalty(LoyaltyError::Embedding(e)) => e.to_string(),
            Self::Loyalty(LoyaltyError::CustomerNotFound(_)) => "Customer not found".to_string(),
            Self::InvalidBody(rejection) => rejection.body_text(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::Loyalty(LoyaltyError::Repository(RepositoryError::Conflict(_))) => {
                "Customer already exists".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
