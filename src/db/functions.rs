//! Application-defined SQL functions
//!
//! `verify_password(candidate, password_hash)` lets the credential query
//! check a password inside SQLite, so the hash never leaves the statement.

use crate::auth::password::verify_password;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Name of the password verification primitive used by the credential query
pub const VERIFY_PASSWORD_FN: &str = "verify_password";

/// Register every application SQL function on a connection
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        VERIFY_PASSWORD_FN,
        2,
        FunctionFlags::SQLITE_UTF8,
        |ctx| {
            let candidate: Option<String> = ctx.get(0)?;
            let stored_hash: Option<String> = ctx.get(1)?;

            let (Some(candidate), Some(stored_hash)) = (candidate, stored_hash) else {
                return Ok(false);
            };

            match verify_password(&candidate, &stored_hash) {
                Ok(valid) => Ok(valid),
                Err(e) => {
                    // Unreadable hashes never authenticate.
                    tracing::warn!(error = %e, "Stored password hash could not be verified");
                    Ok(false)
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::tests::fast_hash;

    fn call(conn: &Connection, candidate: Option<&str>, hash: Option<&str>) -> bool {
        conn.query_row(
            "SELECT verify_password(?1, ?2)",
            rusqlite::params![candidate, hash],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_function_verifies_inside_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        let hash = fast_hash("secret123");
        assert!(call(&conn, Some("secret123"), Some(&hash)));
        assert!(!call(&conn, Some("wrong"), Some(&hash)));
    }

    #[test]
    fn test_function_rejects_null_and_garbage() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        assert!(!call(&conn, None, Some("$argon2id$whatever")));
        assert!(!call(&conn, Some("secret123"), None));
        assert!(!call(&conn, Some("secret123"), Some("not-a-hash")));
    }

    #[test]
    fn test_unregistered_connection_reports_missing_function() {
        let conn = Connection::open_in_memory().unwrap();

        let err = conn
            .query_row("SELECT verify_password('a', 'b')", [], |row| row.get::<_, bool>(0))
            .unwrap_err();
        assert!(err.to_string().contains("no such function"));
    }
}
