//! Argon2id password hashing.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _};

use crate::UserError;

/// Hashes `password` with a fresh random salt, returning a PHC string.
///
/// # Errors
///
/// Returns [`UserError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Hash {
            message: e.to_string(),
        })
}

/// Checks `password` against a stored PHC string.
///
/// # Errors
///
/// Returns [`UserError::Hash`] if the stored hash cannot be parsed.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, UserError> {
    let parsed = PasswordHash::new(phc).map_err(|e| UserError::Hash {
        message: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
