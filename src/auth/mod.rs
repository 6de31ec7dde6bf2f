//! Authentication module
//!
//! This module provides:
//! - The login handler and the current-account endpoint
//! - HS256 token minting and validation
//! - Argon2id password hashing (with legacy bcrypt verification)
//! - Bearer authentication middleware

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use handlers::{login, me};
pub use jwt::{Claims, IssuedToken, TokenService};
pub use middleware::{authenticate, AuthAccount};
pub use password::{hash_password, verify_password};
