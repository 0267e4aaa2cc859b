use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Why a request did not carry a usable session.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Malformed session, please sign in again")]
    BadToken,
    #[error("You need to sign in first")]
    TokenNotFound,
    #[error("Session has expired")]
    TokenExpired,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadToken => StatusCode::BAD_REQUEST,
            Self::TokenNotFound | Self::TokenExpired => StatusCode::UNAUTHORIZED,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_statuses() {
        assert_eq!(
            SessionError::BadToken.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SessionError::TokenNotFound.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SessionError::TokenExpired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
