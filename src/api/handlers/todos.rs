use crate::api::models::{CreateTodoRequest, TodoResponse, UpdateTodoRequest, MAX_TITLE_LEN};
use crate::core::error::{MashebiError, Result};
use crate::db::models::Todo;
use crate::db::repository::Repository;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use super::AppState;

/// Most todos returned by a single listing
const LIST_LIMIT: u32 = 200;

/// Trim a title and enforce the length limit
fn clean_title(raw: Option<String>) -> Result<String> {
    let title = raw.as_deref().unwrap_or_default().trim().to_string();
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(MashebiError::InvalidRequest(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title)
}

fn body_error(e: JsonRejection) -> MashebiError {
    MashebiError::InvalidRequest(format!("Invalid request body: {}", e.body_text()))
}

fn path_error(e: PathRejection) -> MashebiError {
    MashebiError::InvalidRequest(format!("Invalid todo id: {}", e.body_text()))
}

/// Handler for GET /todos - Newest todos first
pub async fn list_todos(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let todos = state.todo_repo.find_recent(LIST_LIMIT).await?;
    let todos: Vec<TodoResponse> = todos.into_iter().map(Into::into).collect();

    Ok(Json(todos))
}

/// Handler for POST /todos - Create a todo
pub async fn create_todo(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload.map_err(body_error)?;
    let title = clean_title(req.title)?;

    let mut todo = Todo {
        id: 0,
        title,
        is_done: false,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    todo.id = state.todo_repo.create(&todo).await?;

    tracing::info!(todo_id = todo.id, "Todo created");

    let location = format!("/todos/{}", todo.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TodoResponse::from(todo)),
    ))
}

/// Handler for PUT /todos/:id - Update title and/or completion
pub async fn update_todo(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id.map_err(path_error)?;
    let Json(req) = payload.map_err(body_error)?;

    let mut todo = state
        .todo_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| MashebiError::NotFound(format!("Todo {} not found", id)))?;

    if req.title.is_some() {
        todo.title = clean_title(req.title)?;
    }
    if let Some(is_done) = req.is_done {
        todo.is_done = is_done;
    }

    if !state.todo_repo.update(&todo).await? {
        return Err(MashebiError::NotFound(format!("Todo {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /todos/:id
pub async fn delete_todo(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id.map_err(path_error)?;
    if !state.todo_repo.delete(id).await? {
        return Err(MashebiError::NotFound(format!("Todo {} not found", id)));
    }

    tracing::info!(todo_id = id, "Todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title(None).unwrap(), "");
        assert_eq!(clean_title(Some("  milk \n".to_string())).unwrap(), "milk");
        assert!(clean_title(Some("x".repeat(MAX_TITLE_LEN))).is_ok());
        assert!(clean_title(Some("x".repeat(MAX_TITLE_LEN + 1))).is_err());
        // Padding does not count toward the limit.
        assert!(clean_title(Some(format!("  {}  ", "x".repeat(MAX_TITLE_LEN)))).is_ok());
        // Characters, not bytes.
        assert!(clean_title(Some("é".repeat(MAX_TITLE_LEN))).is_ok());
    }
}
