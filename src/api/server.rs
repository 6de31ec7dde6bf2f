//! HTTP Server implementation
//!
//! This module provides the HTTP server using Axum framework with:
//! - Configurable host/port binding
//! - Graceful shutdown handling
//! - Request timeouts
//! - CORS support

use crate::api::handlers::AppState;
use crate::api::middleware::{security_headers_middleware, trace_id_middleware};
use crate::api::routes::build_api_routes;
use crate::auth::jwt::TokenService;
use crate::core::config::{Config, ServerConfig};
use crate::db::manager::DatabaseManager;
use crate::db::repository::{AccountRepository, TodoRepository};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// HTTP API Server
pub struct ApiServer {
    router: Router,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server with the given configuration and database manager
    pub fn new(config: Config, db: Arc<DatabaseManager>) -> anyhow::Result<Self> {
        let server_config = config.server.clone();
        let router = Self::build_router(&config, db)?;

        Ok(Self {
            router,
            config: server_config,
        })
    }

    /// Build the Axum router with all routes and middleware
    fn build_router(config: &Config, db: Arc<DatabaseManager>) -> anyhow::Result<Router> {
        let tokens = TokenService::new(&config.auth)
            .map_err(|e| anyhow::anyhow!("Failed to create token service: {}", e))?;

        let app_state = AppState {
            credential_store: Arc::new(AccountRepository::new(db.clone())),
            todo_repo: Arc::new(TodoRepository::new(db)),
            tokens: Arc::new(tokens),
        };

        let router = build_api_routes(app_state).layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(trace_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(Self::build_cors_layer(&config.cors.allowed_origins))
                .layer(middleware::from_fn(security_headers_middleware))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout,
                ))),
        );

        Ok(router)
    }

    /// Build CORS layer from allowed origins configuration
    fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
        use tower_http::cors::Any;

        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if allowed_origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let origins: Vec<_> = allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
    }

    /// Start the HTTP server and listen for requests
    ///
    /// Blocks until a shutdown signal arrives and in-flight requests finish.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr.parse()?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            request_timeout = self.config.request_timeout,
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(socket_addr).await?;

        info!(addr = %socket_addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }

    /// Get a reference to the router
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::TRACE_ID_HEADER;
    use crate::auth::password::tests::fast_hash;
    use crate::core::config::tests::test_auth_config;
    use crate::core::config::{CorsConfig, DatabaseConfig, LoggingConfig};
    use crate::core::error::{GENERIC_SERVER_ERROR, INVALID_CREDENTIALS};
    use crate::db::models::NewAccount;
    use crate::db::repository::tests::seed_alice;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                request_timeout: 30,
            },
            database: DatabaseConfig {
                path: ":memory:".into(),
                connection_pool_size: 1,
                busy_timeout: 5000,
                connection_timeout: 15,
            },
            auth: test_auth_config(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
                output: "stdout".to_string(),
                log_dir: None,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }

    /// Router over a fresh in-memory database seeded with Alice
    async fn seeded_app() -> (Router, Arc<DatabaseManager>, i64) {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let alice = seed_alice(&AccountRepository::new(db.clone())).await;
        let server = ApiServer::new(test_config(), db.clone()).unwrap();
        (server.router().clone(), db, alice)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn login_request(username: &str, password: &str) -> Request<Body> {
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": username, "password": password }),
        )
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(login_request(username, password))
            .await
            .unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    #[tokio::test]
    async fn test_alice_scenario() {
        let (app, _db, alice) = seeded_app().await;

        let (status, body) = login(&app, "alice", "secret123").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accountId"], alice);
        assert_eq!(body["username"], "Alice");
        assert_eq!(body["accountName"], "Acme");
        assert_eq!(body["email"], "a@x.com");
        assert!(body.get("passwordHash").is_none());

        let claims = TokenService::new(&test_auth_config())
            .unwrap()
            .validate(body["token"].as_str().unwrap())
            .unwrap();
        assert_eq!(claims.sub, alice.to_string());
        assert_eq!(claims.account_name, "Acme");

        let (status, body) = login(&app, "alice", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], INVALID_CREDENTIALS);

        let (status, body) = login(&app, "", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidRequest");
        assert!(body["trace_id"].is_string());
    }

    #[tokio::test]
    async fn test_rejections_are_indistinguishable() {
        let (app, db, _) = seeded_app().await;
        AccountRepository::new(db)
            .create(NewAccount {
                account_name: "Acme".to_string(),
                username: "carol".to_string(),
                email: "c@x.com".to_string(),
                password_hash: fast_hash("secret123"),
                is_active: false,
            })
            .await
            .unwrap();

        let mut bodies = Vec::new();
        for (username, password) in [("nobody", "secret123"), ("carol", "secret123"), ("alice", "nope")] {
            let (status, mut body) = login(&app, username, password).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            body.as_object_mut().unwrap().remove("trace_id");
            bodies.push(body.to_string());
        }

        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[1], bodies[2]);
    }

    #[tokio::test]
    async fn test_missing_primitive_is_generic_server_error() {
        let db = Arc::new(DatabaseManager::new_in_memory_without_functions().unwrap());
        let app = ApiServer::new(test_config(), db).unwrap().router().clone();

        let (status, body) = login(&app, "alice", "secret123").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], GENERIC_SERVER_ERROR);
        assert!(!body.to_string().contains("verify_password"));
    }

    #[tokio::test]
    async fn test_repeated_logins_mint_distinct_tokens_without_writes() {
        let (app, db, alice) = seeded_app().await;

        let row = |db: Arc<DatabaseManager>| async move {
            db.execute(move |conn| {
                Ok(conn.query_row(
                    "SELECT account_name, username, email, password_hash, is_active FROM accounts WHERE id = ?",
                    [alice],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, String>(1)?,
                            r.get::<_, String>(2)?,
                            r.get::<_, String>(3)?,
                            r.get::<_, bool>(4)?,
                        ))
                    },
                )?)
            })
            .await
            .unwrap()
        };

        let before = row(db.clone()).await;

        let tokens = TokenService::new(&test_auth_config()).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5 {
            let (status, body) = login(&app, "alice", "secret123").await;
            assert_eq!(status, StatusCode::OK);
            let token = body["token"].as_str().unwrap().to_string();
            assert!(tokens.validate(&token).is_ok());
            assert!(seen.insert(token));
        }

        assert_eq!(row(db).await, before);
    }

    #[tokio::test]
    async fn test_concurrent_logins() {
        let (app, _db, _) = seeded_app().await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move {
                    let password = if i % 2 == 0 { "secret123" } else { "wrong" };
                    app.oneshot(login_request("ALICE", password))
                        .await
                        .unwrap()
                        .status()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let expected = if i % 2 == 0 {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };
            assert_eq!(handle.await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_me_requires_valid_bearer() {
        let (app, _db, alice) = seeded_app().await;
        let (_, body) = login(&app, "alice", "secret123").await;
        let token = body["token"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let me = body_json(response).await;
        assert_eq!(me["accountId"], alice);
        assert!(me["accountId"].is_i64());
        assert_eq!(me["username"], "Alice");
        assert_eq!(me["accountName"], "Acme");
        assert!(me["expiresAt"].is_string());

        let response = app.clone().oneshot(get("/api/auth/me")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_todo_endpoints() {
        let (app, _db, _) = seeded_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/todos", json!({ "title": "  buy milk " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let created = body_json(response).await;
        assert_eq!(created["title"], "buy milk");
        assert_eq!(created["isDone"], false);
        assert_eq!(location, format!("/todos/{}", created["id"]));

        let response = app
            .clone()
            .oneshot(json_request("POST", "/todos", json!({ "title": "x".repeat(201) })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_request("PUT", &location, json!({ "isDone": true })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.clone().oneshot(get("/todos")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["isDone"], true);
        assert_eq!(list[0]["title"], "buy milk");

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/todos/9999", json!({ "title": "y" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/todos/abc", json!({ "isDone": true })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "InvalidRequest");
        assert!(body["trace_id"].is_string());

        let delete = |uri: String| {
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(delete(location.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app.clone().oneshot(delete(location)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(delete("/todos/abc".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "InvalidRequest");
    }

    #[tokio::test]
    async fn test_health_and_root_with_middleware_headers() {
        let (app, _db, _) = seeded_app().await;

        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(TRACE_ID_HEADER));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        let health = body_json(response).await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["version"], crate::VERSION);

        let response = app.oneshot(get("/")).await.unwrap();
        let root = body_json(response).await;
        assert_eq!(root["ok"], true);
        assert_eq!(root["db"], "sqlite");
    }

    #[test]
    fn test_short_secret_fails_server_build() {
        let mut config = test_config();
        config.auth.jwt_secret = "short".to_string();

        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        assert!(ApiServer::new(config, db).is_err());
    }
}
