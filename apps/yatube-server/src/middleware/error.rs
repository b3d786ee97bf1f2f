//! Error handling - every failure renders one of the `core/` error views.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use yatube_core::error::{DomainError, RepoError};
use yatube_core::ports::{AuthError, StorageError};
use yatube_shared::ErrorResponse;

use crate::views::{View, rendered};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn template(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "core/404.html",
            AppError::Forbidden => "core/403.html",
            AppError::Internal(_) => "core/500.html",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::Forbidden => ErrorResponse::forbidden(),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        let body = View::new(self.template(), json!({ "error": error })).and_then(|v| v.body());
        match body {
            Ok(body) => rendered(self.status_code(), body),
            Err(_) => HttpResponse::build(self.status_code()).finish(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} {} not found", entity_type, key))
            }
            DomainError::Unauthorized => AppError::Forbidden,
            DomainError::Validation(msg) | DomainError::Duplicate(msg) => AppError::Internal(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Internal(format!("constraint violated: {msg}")),
            RepoError::Connection(msg) => {
                AppError::Internal(format!("database connection error: {msg}"))
            }
            RepoError::Query(msg) => AppError::Internal(format!("database query error: {msg}")),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(format!("image storage failed: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("view serialization failed: {err}"))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
