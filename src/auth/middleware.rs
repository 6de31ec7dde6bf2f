//! Authentication middleware

use crate::api::handlers::AppState;
use crate::auth::jwt::Claims;
use crate::core::error::{MashebiError, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Authenticated account stored in request extensions
///
/// Built purely from token claims; no store lookup happens.
#[derive(Clone, Debug)]
pub struct AuthAccount {
    pub claims: Claims,
}

/// Bearer token middleware for protected routes
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let token = match token {
        Some(t) => t,
        None => {
            return MashebiError::AuthenticationError("Missing authentication token".to_string())
                .into_response();
        }
    };

    let claims = match state.tokens.validate(&token) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return MashebiError::AuthenticationError("Invalid or expired token".to_string())
                .into_response();
        }
    };

    request.extensions_mut().insert(AuthAccount { claims });

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
{
    type Rejection = MashebiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthAccount>()
            .cloned()
            .ok_or_else(|| MashebiError::AuthenticationError("Not authenticated".to_string()))
    }
}
