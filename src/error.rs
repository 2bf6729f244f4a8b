//! Request-boundary error taxonomy.
//!
//! Every failure a handler can produce is translated into one of these
//! variants; the `IntoResponse` impl is the single place status codes and
//! response bodies are decided. Nothing is swallowed below this layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::store::StoreError;

/// Uniform message for every token-related authentication failure.
/// Deliberately does not distinguish missing vs malformed vs expired.
pub const BAD_TOKEN: &str = "Invalid or expired token. Please log in again.";

/// Uniform message for login failure. Identical for unknown email and
/// wrong password so the endpoint cannot be used to enumerate accounts.
pub const BAD_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed id, missing required field, or an empty patch. 400.
    #[error("{0}")]
    Validation(String),
    /// Missing, invalid or expired token, or bad login credentials. 401.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// Authenticated, but the role does not permit the operation. 403.
    #[error("Access denied. Admin privileges required.")]
    Forbidden,
    /// Missing document, or an existing document owned by another
    /// business. The two are indistinguishable on purpose. 404.
    #[error("{0}")]
    NotFound(&'static str),
    /// Duplicate unique key. 409.
    #[error("{0}")]
    Conflict(String),
    /// The image host or completion service failed. 502.
    #[error("{0}")]
    Upstream(String),
    /// Store failure or a malformed success payload from upstream. 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(detail = %self, "internal error");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized(BAD_TOKEN).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound("Product not found.").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Upstream("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
