//! HTTP API handlers for tutorlink-engage
//!
//! Thin presentation boundary: each handler resolves the caller from the
//! `X-User-Id` header, invokes one lifecycle operation, and maps the
//! result to JSON. All authorization beyond header extraction lives in
//! the lifecycle modules themselves.

pub mod connections;
pub mod error;
pub mod health;
pub mod identity;
pub mod messages;
pub mod notifications;
pub mod profiles;
pub mod sessions;
pub mod sse;
pub mod tasks;

pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use identity::CallerId;
pub use sse::event_stream;
