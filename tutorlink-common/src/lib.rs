//! # TutorLink Common Library
//!
//! Shared code for the TutorLink engagement service including:
//! - Database initialization and typed entity models
//! - Event types (EngageEvent enum) and the broadcast EventBus
//! - Configuration loading and root folder resolution
//! - Error types
//! - UUID utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod ids;

pub use error::{Error, Result};
