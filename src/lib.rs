//! Mashebi API Library
//!
//! Credential login with HS256 bearer tokens and a small todo API over
//! SQLite.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{Config, MashebiError};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
