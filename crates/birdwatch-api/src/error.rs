//! Error types for the API layer.
//!
//! [`ApiError`] unifies all handler failure modes into a single enum that
//! converts into the `{success: false, error}` JSON envelope via its
//! [`IntoResponse`] implementation. Only validation messages reach the
//! client; storage failures are logged and answered generically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use birdwatch_db::DbError;
use birdwatch_types::ValidationFailure;

/// Client-facing message for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Client-facing message for unknown observation ids.
pub const NOT_FOUND_MESSAGE: &str = "Observation not found";

/// Client-facing message for unmatched routes.
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Route not found";

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The payload was rejected; the message is passed through.
    #[error("{0}")]
    Validation(String),

    /// No observation has the requested id (including malformed ids).
    #[error("observation not found")]
    NotFound,

    /// The store failed.
    #[error("storage error: {0}")]
    Storage(DbError),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(failure) => Self::Validation(failure.to_string()),
            other => Self::Storage(other),
        }
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation(failure.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_owned()),
            Self::Storage(err) => {
                tracing::error!(error = %err, "Storage operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_owned(),
                )
            }
        };

        failure_response(status, &message)
    }
}

/// The `{success: false, error}` envelope with `status`.
pub fn failure_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": message,
    });

    (status, axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let failure = ValidationFailure::single("commonName", "commonName is required");
        let response = ApiError::from(DbError::Validation(failure)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn storage_maps_to_500() {
        let response = ApiError::from(DbError::Corrupt(String::from("bad row"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
