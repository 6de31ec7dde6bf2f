use crate::db::models::Todo;
use serde::{Deserialize, Serialize};

/// Longest accepted todo title, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Todo as returned by the API
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub is_done: bool,
    pub created_at: String,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            is_done: todo.is_done,
            created_at: todo.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub is_done: Option<bool>,
}
