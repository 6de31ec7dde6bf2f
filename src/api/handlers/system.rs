use axum::Json;
use serde_json::{json, Value};

/// Handler for GET / - Liveness with a database tag
pub async fn root() -> Json<Value> {
    Json(json!({
        "ok": true,
        "db": "sqlite",
        "ts": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Handler for GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let value = health_check().await.0;

        assert_eq!(value["status"], "ok");
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_root() {
        let value = root().await.0;

        assert_eq!(value["ok"], true);
        assert_eq!(value["db"], "sqlite");
        assert!(chrono::DateTime::parse_from_rfc3339(value["ts"].as_str().unwrap()).is_ok());
    }
}
