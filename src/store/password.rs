//! Credential hashing for the store adapter.
//!
//! Argon2id with per-password random salts. Raw passwords exist only in the
//! request path; records carry the PHC-format hash string.

use anyhow::{Result, anyhow};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::rngs::OsRng;

/// Hash a raw password into a PHC string for storage.
///
/// # Errors
/// Returns an error if hashing fails (effectively only on RNG failure).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Compare a presented password against a stored hash.
///
/// Any parse or verification failure counts as a mismatch; this never errors
/// so callers treat corrupt hashes the same as wrong passwords.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
