//! JWT token generation and validation

use crate::core::config::{AuthConfig, MIN_JWT_SECRET_LEN};
use crate::core::error::{MashebiError, Result};
use crate::db::models::AccountRecord;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    /// Username as stored
    pub unique_name: String,
    /// Same value as `sub`; kept for clients reading named claims
    pub account_id: String,
    pub account_name: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// A freshly minted token and its validity window
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Mints and validates HS256 bearer tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
    leeway_secs: u64,
}

impl TokenService {
    /// Build the service from the auth configuration
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(MashebiError::ConfigError(format!(
                "jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }

        let ttl = i64::try_from(config.token_ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(|| MashebiError::ConfigError("token_ttl_hours is too large".to_string()))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl,
            leeway_secs: config.clock_skew_secs,
        })
    }

    /// Mint a token for an account, valid from now
    pub fn mint(&self, account: &AccountRecord) -> Result<IssuedToken> {
        self.mint_at(account, Utc::now())
    }

    /// Mint a token for an account as if issued at `issued_at`
    pub fn mint_at(&self, account: &AccountRecord, issued_at: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| MashebiError::TokenError("Failed to calculate expiration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            unique_name: account.username.clone(),
            account_id: account.id.to_string(),
            account_name: account.account_name.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| MashebiError::TokenError(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Validate signature, issuer, audience and validity window
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| MashebiError::AuthenticationError(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Convert a claim timestamp back to a UTC datetime
pub fn claim_time(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0).single()
}
