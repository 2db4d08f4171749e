//! Password hashing with Argon2.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$...`) so the salt and
//! parameters travel with the hash. Accounts created with bcrypt (`$2b$...`)
//! still verify, but new hashes are always Argon2. Both operations are
//! CPU-heavy and run on tokio's blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::QuizError;

/// Hash a plaintext password into a PHC string.
pub async fn hash_password(password: &str) -> Result<String, QuizError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password_blocking(&password))
        .await
        .map_err(|e| QuizError::Credential(format!("hash task failed: {}", e)))?
}

/// Check a plaintext password against a stored Argon2 or bcrypt hash.
///
/// A stored value that is neither never verifies.
pub async fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_password_blocking(&password, &hash))
        .await
        .unwrap_or(false)
}

fn hash_password_blocking(password: &str) -> Result<String, QuizError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| QuizError::Credential(e.to_string()))
}

fn verify_password_blocking(password: &str, hash: &str) -> bool {
    if hash.starts_with("$2") {
        return bcrypt::verify(password, hash).unwrap_or(false);
    }

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
