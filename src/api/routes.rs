//! API routes

use crate::api::handlers::{
    create_todo, delete_todo, health_check, list_todos, root, update_todo, AppState,
};
use crate::auth::handlers::{login, me};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/auth/login", post(login))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/:id", put(update_todo).delete(delete_todo));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
