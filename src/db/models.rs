//! Database models
//!
//! Data structures representing database tables, each with an explicit
//! column-to-field mapping.

use rusqlite::Row;

/// Maps one result row onto a model by column name
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Identity fields of an active account that passed verification
///
/// The password hash is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: i64,
    pub account_name: String,
    pub username: String,
    pub email: String,
}

impl FromRow for AccountRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            account_name: row.get("account_name")?,
            username: row.get("username")?,
            email: row.get("email")?,
        })
    }
}

/// Account to be provisioned
pub struct NewAccount {
    pub account_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// Todo record in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub is_done: bool,
    pub created_at: String,
}

impl FromRow for Todo {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            is_done: row.get("is_done")?,
            created_at: row.get("created_at")?,
        })
    }
}
