//! Database initialization and typed entity models

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
