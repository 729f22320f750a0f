//! Caller identity extraction
//!
//! Authentication happens upstream (gateway session handling); the
//! resolved user id arrives in the `X-User-Id` header. This extractor
//! parses it once per request, and every lifecycle operation receives the
//! caller explicitly from there. Requests without a parseable id are
//! rejected with 401 before any handler runs.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tutorlink_common::Error;
use uuid::Uuid;

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, resolved by the upstream gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(USER_ID_HEADER).ok_or_else(|| {
            ApiError(Error::Unauthorized("Missing X-User-Id header".to_string()))
        })?;

        let text = value.to_str().map_err(|_| {
            ApiError(Error::Unauthorized(
                "Malformed X-User-Id header".to_string(),
            ))
        })?;

        let id = Uuid::parse_str(text).map_err(|_| {
            ApiError(Error::Unauthorized(
                "Malformed X-User-Id header".to_string(),
            ))
        })?;

        Ok(CallerId(id))
    }
}
