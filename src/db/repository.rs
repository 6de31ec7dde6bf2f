//! Repository pattern implementation for data access layer

use crate::auth::password::hash_password;
use crate::core::error::{MashebiError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{AccountRecord, FromRow, NewAccount, Todo};
use async_trait::async_trait;
use rusqlite::OptionalExtension;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Credential lookup and verification in a single statement.
///
/// `verify_password` is an application SQL function registered on every
/// pooled connection (see `db::functions`). Exactly one verification runs
/// per call: against the matching account's hash, or against `?3` when no
/// account has that username, so a miss costs as much as a wrong password.
/// The second branch never yields a row.
const VERIFY_CREDENTIALS_SQL: &str = "SELECT id, account_name, username, email FROM accounts \
     WHERE username_key = ?1 \
       AND CASE WHEN verify_password(?2, password_hash) THEN is_active = 1 ELSE 0 END \
     UNION ALL \
     SELECT NULL, NULL, NULL, NULL \
     WHERE CASE WHEN EXISTS (SELECT 1 FROM accounts WHERE username_key = ?1) THEN 0 \
       ELSE verify_password(?2, ?3) = 2 END \
     LIMIT 1";

/// Hash of a random secret, verified against when no account matches
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

fn dummy_hash() -> Result<&'static str> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash.as_str());
    }
    let hash = hash_password(&Uuid::new_v4().to_string())?;
    Ok(DUMMY_HASH.get_or_init(|| hash).as_str())
}

/// Case-insensitive lookup key for a username
///
/// Full Unicode lowercasing; SQLite's `lower()` only folds ASCII.
pub fn username_key(username: &str) -> String {
    username.to_lowercase()
}

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: i64) -> Result<Option<T>>;

    /// Create a new entity, returning the store-assigned ID
    async fn create(&self, entity: &T) -> Result<i64>;

    /// Update an existing entity; false if it does not exist
    async fn update(&self, entity: &T) -> Result<bool>;

    /// Delete an entity by its ID; false if it does not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Read-side access to account credentials used by the login flow
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Return the identity of the active account matching both username
    /// (case-insensitively) and password, or `None`
    async fn verify(&self, username: &str, password: &str) -> Result<Option<AccountRecord>>;
}

/// Repository for accounts
pub struct AccountRepository {
    db: Arc<DatabaseManager>,
}

impl AccountRepository {
    /// Create a new AccountRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Insert a new account; fails if the username is taken in any casing
    pub async fn create(&self, account: NewAccount) -> Result<i64> {
        let key = username_key(&account.username);
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO accounts (account_name, username, username_key, email, password_hash, is_active, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &account.account_name,
                        &account.username,
                        &key,
                        &account.email,
                        &account.password_hash,
                        account.is_active,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }
}

#[async_trait]
impl CredentialStore for AccountRepository {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<AccountRecord>> {
        let key = username_key(username);
        let password = password.to_string();

        self.db
            .execute(move |conn| {
                let dummy = dummy_hash()?;
                let mut stmt = conn
                    .prepare_cached(VERIFY_CREDENTIALS_SQL)
                    .map_err(MashebiError::from_verification_query)?;

                stmt.query_row(rusqlite::params![&key, &password, dummy], AccountRecord::from_row)
                    .optional()
                    .map_err(MashebiError::from_verification_query)
            })
            .await
    }
}

/// Repository for todos
pub struct TodoRepository {
    db: Arc<DatabaseManager>,
}

impl TodoRepository {
    /// Create a new TodoRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Newest todos first, at most `limit`
    pub async fn find_recent(&self, limit: u32) -> Result<Vec<Todo>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, is_done, created_at FROM todos ORDER BY id DESC LIMIT ?",
                )?;

                let todos = stmt
                    .query_map([limit], Todo::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(todos)
            })
            .await
    }
}

#[async_trait]
impl Repository<Todo> for TodoRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>> {
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, title, is_done, created_at FROM todos WHERE id = ?",
                        [id],
                        Todo::from_row,
                    )
                    .optional()?)
            })
            .await
    }

    async fn create(&self, todo: &Todo) -> Result<i64> {
        let todo = todo.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO todos (title, is_done, created_at) VALUES (?, ?, ?)",
                    rusqlite::params![&todo.title, todo.is_done, &todo.created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    async fn update(&self, todo: &Todo) -> Result<bool> {
        let todo = todo.clone();
        self.db
            .execute(move |conn| {
                let changed = conn.execute(
                    "UPDATE todos SET title = ?, is_done = ? WHERE id = ?",
                    rusqlite::params![&todo.title, todo.is_done, todo.id],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.db
            .execute(move |conn| {
                let changed = conn.execute("DELETE FROM todos WHERE id = ?", [id])?;
                Ok(changed > 0)
            })
            .await
    }
}
