//! HTTP error mapping
//!
//! Wraps the shared error type so handlers can use `?` and have each
//! variant land on its status code with a uniform JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use tutorlink_common::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Response-side wrapper around the shared error type
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::StateConflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            // Store and internal failures surface as a generic 500; the
            // detail goes to the log, not the client.
            Error::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            other => {
                error!("Internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
