//! Error types for TutorLink

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Shared error type spanning the store boundary and the lifecycle modules.
///
/// The HTTP layer maps each variant to a status code; see
/// `tutorlink-engage/src/api/error.rs`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller identity is missing or unparseable.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is known but not a party to the entity it addressed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Entity exists but is not in a state that permits the operation.
    #[error("Conflict: {0}")]
    StateConflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
