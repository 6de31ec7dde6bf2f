pub mod system;
pub mod todos;

pub use system::*;
pub use todos::*;

use crate::auth::jwt::TokenService;
use crate::db::repository::{CredentialStore, TodoRepository};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub credential_store: Arc<dyn CredentialStore>,
    pub todo_repo: Arc<TodoRepository>,
    pub tokens: Arc<TokenService>,
}
