//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::auth::jwt::claim_time;
use crate::auth::middleware::AuthAccount;
use crate::auth::models::{CurrentAccountResponse, LoginRequest, LoginResponse};
use crate::core::error::{MashebiError, Result, INVALID_CREDENTIALS};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

/// Handler for POST /api/auth/login
///
/// Whitespace-only credentials are rejected before the store is touched.
/// The username is trimmed for lookup; the password is verified as sent.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Unreadable login body");
        MashebiError::InvalidRequest("Username and password are required".to_string())
    })?;

    let username = req.username.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.as_deref().unwrap_or_default();

    if username.is_empty() || password.trim().is_empty() {
        return Err(MashebiError::InvalidRequest(
            "Username and password are required".to_string(),
        ));
    }

    let account = match state.credential_store.verify(username, password).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            tracing::info!(username = %username, "Login rejected");
            return Err(MashebiError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }
        Err(e) => {
            if let MashebiError::VerifierUnavailable(_) = e {
                tracing::error!(
                    username = %username,
                    "verify_password is not registered on the database connection"
                );
            } else {
                tracing::error!(username = %username, error = %e, "Credential lookup failed");
            }
            return Err(e);
        }
    };

    let issued = state.tokens.mint(&account)?;

    tracing::info!(account_id = account.id, username = %account.username, "Login successful");

    Ok(Json(LoginResponse {
        token: issued.token,
        account_id: account.id,
        username: account.username,
        account_name: account.account_name,
        email: account.email,
    }))
}

/// Handler for GET /api/auth/me
pub async fn me(account: AuthAccount) -> Result<Json<CurrentAccountResponse>> {
    let claims = account.claims;

    let account_id = claims
        .account_id
        .parse::<i64>()
        .map_err(|_| MashebiError::AuthenticationError("Invalid token".to_string()))?;
    let issued_at = claim_time(claims.iat)
        .ok_or_else(|| MashebiError::AuthenticationError("Invalid token".to_string()))?;
    let expires_at = claim_time(claims.exp)
        .ok_or_else(|| MashebiError::AuthenticationError("Invalid token".to_string()))?;

    Ok(Json(CurrentAccountResponse {
        account_id,
        username: claims.unique_name,
        account_name: claims.account_name,
        issued_at: issued_at.to_rfc3339(),
        expires_at: expires_at.to_rfc3339(),
    }))
}
