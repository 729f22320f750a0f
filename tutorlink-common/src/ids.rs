//! UUID utilities
//!
//! Identifiers are stored as TEXT in SQLite; these helpers keep the
//! generate/parse pair in one place.

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a UUID out of a stored TEXT column
pub fn parse(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Malformed UUID '{}': {}", s, e)))
}
