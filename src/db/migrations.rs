//! Database migrations
//!
//! Versioned schema changes tracked in `schema_migrations`; each version is
//! applied in its own transaction.

use crate::core::error::Result;
use rusqlite::Connection;
use tracing::{info, warn};

/// Migration version tracking table
const MIGRATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Initial schema migration (version 1)
const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(title) <= 200),
    is_done INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_todos_is_done ON todos(is_done);
"#;

/// Second schema migration (version 2)
const MIGRATION_V2: &str = r#"
-- Accounts (login)
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_name TEXT NOT NULL CHECK (length(account_name) > 0),
    username TEXT NOT NULL,
    -- Unicode lowercase of username, computed by the application
    username_key TEXT NOT NULL,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Case-insensitive uniqueness; also serves the credential lookup
CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_username_key ON accounts(username_key);
"#;

/// Ordered list of all migrations
const MIGRATIONS: &[(i64, &str, &str)] = &[
    (1, "Todo list", MIGRATION_V1),
    (2, "Accounts", MIGRATION_V2),
];

/// Run all pending database migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    info!("Running database migrations");

    conn.execute_batch(MIGRATION_TABLE)?;

    let current_version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    info!(current_version, "Current database schema version");

    for (version, name, sql) in MIGRATIONS {
        if current_version < *version {
            info!(version, name, "Applying migration");
            apply_migration(conn, *version, sql)?;
        }
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Apply a single migration
fn apply_migration(conn: &mut Connection, version: i64, sql: &str) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(sql).map_err(|e| {
        warn!(version, error = %e, "Migration failed");
        e
    })?;

    tx.execute("INSERT INTO schema_migrations (version) VALUES (?)", [version])?;

    tx.commit()?;

    info!(version, "Migration applied successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_version(conn: &Connection) -> i64 {
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_migrations_apply_and_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();

        run_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn), 2);

        run_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn), 2);
    }

    #[test]
    fn test_username_key_unique() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO accounts (account_name, username, username_key, email, password_hash) VALUES ('Acme', 'Alice', 'alice', 'a@x.com', 'h')",
            [],
        )
        .unwrap();

        let duplicate = conn.execute(
            "INSERT INTO accounts (account_name, username, username_key, email, password_hash) VALUES ('Acme', 'ALICE', 'alice', 'b@x.com', 'h')",
            [],
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_todo_title_length_checked() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        let long_title = "x".repeat(201);
        let result = conn.execute(
            "INSERT INTO todos (title, created_at) VALUES (?, 'now')",
            [&long_title],
        );
        assert!(result.is_err());
    }
}
