//! Authentication request/response models

use serde::{Deserialize, Serialize};

/// Login request; both fields are optional on the wire
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub account_id: i64,
    pub username: String,
    pub account_name: String,
    pub email: String,
}

/// Identity carried by a validated bearer token
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAccountResponse {
    pub account_id: i64,
    pub username: String,
    pub account_name: String,
    pub issued_at: String,
    pub expires_at: String,
}
