use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use crate::errors::auth::AuthError;

/// Hash a plaintext password with Argon2id and a fresh random salt.
/// The result is a PHC-format string; the plaintext is never stored.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::internal_error(format!("Password hashing error: {}", e)))?
        .to_string();

    Ok(hash)
}

/// Verify a plaintext password against a stored PHC hash.
/// An unparseable hash verifies as false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
