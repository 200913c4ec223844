//! # Error Handling
//!
//! Two error families live here:
//! - [`ProviderError`]: what can go wrong talking to the session provider. The
//!   gate and guards never surface these; they collapse into "no session".
//! - [`AppError`]: errors an HTTP handler may return, converted into JSON
//!   responses by the `IntoResponse` impl below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a call to the session provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider could not be reached, timed out, or answered with a 5xx.
    ///
    /// The session may still be perfectly valid; we just could not confirm it.
    #[error("session provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered and refused the token (expired, revoked, unknown)
    #[error("session rejected by provider ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider answered 2xx with a body we could not understand
    #[error("malformed provider response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProviderError {
    /// True when the provider told us the credential is no good, as opposed to
    /// us failing to get an answer.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ProviderError::Rejected { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Unavailable(e.to_string())
    }
}

/// Application-wide error type for JSON endpoints
#[derive(Error, Debug)]
pub enum AppError {
    /// Session provider errors that reach a handler (sign-out, code exchange)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Resource not found errors (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request errors (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication errors (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server errors (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Provider(e) => {
                tracing::error!("Provider error: {:?}", e);
                let status = if e.is_rejection() {
                    StatusCode::UNAUTHORIZED
                } else {
                    StatusCode::BAD_GATEWAY
                };
                // Don't leak provider internals to the caller
                (status, "Authentication service error".to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Convenience alias: `AppResult<Json<Value>>` instead of `Result<Json<Value>, AppError>`
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_rejection_maps_to_unauthorized() {
        let err = AppError::from(ProviderError::Rejected {
            status: 401,
            message: "invalid JWT".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn provider_outage_maps_to_bad_gateway() {
        let err = AppError::from(ProviderError::Unavailable("connection refused".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn only_rejections_count_as_rejections() {
        assert!(ProviderError::Rejected {
            status: 400,
            message: "invalid_grant".to_string()
        }
        .is_rejection());
        assert!(!ProviderError::Unavailable("timeout".to_string()).is_rejection());
    }

    #[test]
    fn client_errors_keep_their_message() {
        let response = AppError::BadRequest("missing code".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
