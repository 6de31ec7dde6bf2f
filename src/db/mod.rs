//! Database module
//!
//! This module provides database management functionality including:
//! - SQLite connection pool management
//! - Application SQL functions registered on every connection
//! - Repository implementations
//! - Versioned migrations
//! - Data models with explicit row mapping

pub mod functions;
pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::DatabaseManager;
pub use models::{AccountRecord, FromRow, NewAccount, Todo};
pub use repository::{AccountRepository, CredentialStore, Repository, TodoRepository};
