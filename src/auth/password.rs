// Password hashing and verification service

use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::auth::error::AuthError;

/// Digest checked when the email is unknown, so both sign-in failures cost one verify
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a fresh random salt.
    ///
    /// Returns a PHC-formatted string carrying the salt and parameters.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// A malformed digest never matches; it is not an error.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash could not be parsed");
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// [`Self::hash_password`] on the blocking pool
    pub async fn hash(password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
    }

    /// [`Self::verify_password`] on the blocking pool. A failed task never matches.
    pub async fn verify(password: &str, hash: &str) -> bool {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Password verification task failed: {}", e);
                false
            })
    }

    /// Burns one verification against a fixed digest. Always false.
    pub async fn verify_dummy(password: &str) -> bool {
        let password = password.to_owned();
        let burned = tokio::task::spawn_blocking(move || {
            let dummy = DUMMY_HASH.get_or_init(|| Self::hash_password("dummy-password").ok());
            if let Some(hash) = dummy {
                let _ = Self::verify_password(&password, hash);
            }
        })
        .await;

        if let Err(e) = burned {
            tracing::error!("Dummy verification task failed: {}", e);
        }
        false
    }
}
