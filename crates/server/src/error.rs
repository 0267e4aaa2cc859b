use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;

const RETRY_LATER: &str = "Something went wrong, please try again later";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid email or password")]
    BadCredentials,
    #[error("too many attempts, please wait a minute and try again")]
    TooManyAttempts,
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("password hashing failed: {0}")]
    Hashing(#[from] argon2::password_hash::Error),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("input value is invalid: `{value}`, reason: {reason}")]
    InvalidInput { value: String, reason: String },
    #[error("limit exceeded for {subject}, allowed {limit} {unit}(s), got {attempted}")]
    LimitExceeded {
        subject: String,
        unit: String,
        attempted: u64,
        limit: u64,
    },
    #[error("requested object already exists")]
    AlreadyExists,
    #[error("requested object doesn't exist or the caller doesn't have access")]
    NotFound,
}

impl ValidationError {
    pub fn invalid(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Sqlx(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not found".into()),
                e => {
                    error!("received database error for user request: {e}");
                    (StatusCode::INTERNAL_SERVER_ERROR, RETRY_LATER.into())
                }
            },
            Self::Storage(e) => {
                error!("received storage error for user request: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, RETRY_LATER.into())
            }
            Self::Hashing(e) => {
                error!("failed to hash password for user request: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, RETRY_LATER.into())
            }
            Self::Validation(e @ ValidationError::NotFound) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            Self::Validation(e @ ValidationError::AlreadyExists) => {
                (StatusCode::CONFLICT, e.to_string())
            }
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            e @ Self::BadCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
            e @ Self::TooManyAttempts => (StatusCode::TOO_MANY_REQUESTS, e.to_string()),
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}
