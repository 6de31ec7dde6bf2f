//! Database manager implementation
//!
//! This module provides database connection management with:
//! - SQLite connection pool using r2d2
//! - Application SQL functions installed on every pooled connection
//! - Async wrapper for database operations

use crate::core::error::{MashebiError, Result};
use crate::db::functions::register_functions;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tokio::task;

/// Database manager with connection pool
#[derive(Clone)]
pub struct DatabaseManager {
    pool: Pool<SqliteConnectionManager>,
}

impl DatabaseManager {
    /// Open (or create) the database file and run migrations
    pub fn new(
        db_path: &Path,
        pool_size: u32,
        busy_timeout: Duration,
        connection_timeout: Duration,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            register_functions(conn)?;
            Ok(())
        });

        Self::build(manager, pool_size, connection_timeout)
    }

    /// Create a new DatabaseManager with an in-memory database for testing
    pub fn new_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            register_functions(conn)?;
            Ok(())
        });

        // Every in-memory connection is its own database, so keep exactly one.
        Self::build(manager, 1, Duration::from_secs(30))
    }

    /// In-memory database whose connections lack the application SQL functions
    #[cfg(test)]
    pub(crate) fn new_in_memory_without_functions() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        Self::build(manager, 1, Duration::from_secs(30))
    }

    fn build(
        manager: SqliteConnectionManager,
        pool_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self> {
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(connection_timeout)
            .build(manager)?;

        let manager = Self { pool };
        manager.migrate()?;

        Ok(manager)
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Execute a database operation asynchronously
    ///
    /// The closure runs on the blocking thread pool. The pooled connection is
    /// returned to the pool when the closure finishes, whatever it returns.
    pub async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| MashebiError::TaskError(format!("Database task panicked: {}", e)))?
    }

    /// Execute database migrations
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.get_connection()?;
        crate::db::migrations::run_migrations(&mut conn)
    }

    /// Get the configured pool size
    pub fn pool_size(&self) -> u32 {
        self.pool.max_size()
    }

    /// Get the number of idle connections in the pool
    #[cfg(test)]
    pub(crate) fn idle_connections(&self) -> u32 {
        self.pool.state().idle_connections
    }
}
