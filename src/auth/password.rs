//! Password hashing and verification
//!
//! New hashes are Argon2id PHC strings. Hashes imported from the earlier
//! pgcrypto deployment (`crypt(.., gen_salt('bf'))`, i.e. `$2a$`/`$2b$`)
//! are still accepted and checked with bcrypt.

use crate::core::error::{MashebiError, Result};
use argon2::password_hash::{
    rand_core::OsRng, Error as PhcError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Hash a password with Argon2id and the library's recommended cost
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with_params(password, Params::default())
}

/// Hash a password with Argon2id and explicit cost parameters
pub fn hash_password_with_params(password: &str, params: Params) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| MashebiError::HashingError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash
///
/// Returns `Ok(false)` on a mismatch and `Err` only when the stored value
/// cannot be interpreted as a hash at all.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    if is_bcrypt_hash(stored_hash) {
        return bcrypt::verify(password, stored_hash)
            .map_err(|e| MashebiError::HashingError(format!("Failed to verify bcrypt hash: {}", e)));
    }

    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| MashebiError::HashingError(format!("Malformed password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(e) => Err(MashebiError::HashingError(format!(
            "Failed to verify password hash: {}",
            e
        ))),
    }
}

fn is_bcrypt_hash(stored_hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| stored_hash.starts_with(prefix))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Low-cost parameters so tests don't spend seconds per hash
    pub(crate) fn fast_hash(password: &str) -> String {
        let params = Params::new(1024, 1, 1, None).unwrap();
        hash_password_with_params(password, params).unwrap()
    }

    #[test]
    fn test_argon2_round_trip() {
        let hash = fast_hash("secret123");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(fast_hash("secret123"), fast_hash("secret123"));
    }

    #[test]
    fn test_default_params_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
    }

    #[test]
    fn test_legacy_bcrypt_hash() {
        let hash = bcrypt::hash("secret123", 4).unwrap();

        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("Secret123", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("secret123", "plaintext-password").is_err());
        assert!(verify_password("secret123", "").is_err());
    }
}
