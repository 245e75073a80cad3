//! Client secret generation, hashing, and comparison.
//!
//! This module provides cryptographically secure secret generation and
//! Argon2-based hashing for client authentication.
//!
//! # Security
//!
//! - Secrets are 256-bit random values (32 bytes) encoded as hexadecimal
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - Comparison may be CPU-expensive and is treated as a suspension point;
//!   deployments can substitute a different KDF through [`SecretHasher`]
//!
//! # Example
//!
//! ```
//! use oxidc_auth::secret::{generate_client_secret, hash_client_secret};
//!
//! // Generate a new secret
//! let secret = generate_client_secret();
//!
//! // Hash for storage
//! let hash = hash_client_secret(&secret).unwrap();
//! assert!(hash.starts_with("$argon2id$"));
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use rand::Rng;

use crate::AuthResult;
use crate::error::AuthError;

/// Compares a stored secret hash against a presented plaintext secret.
///
/// Implementations must return an error for any outcome other than a
/// successful match; callers treat every failure as a failed authentication.
#[async_trait]
pub trait SecretHasher: Send + Sync {
    /// Compares a stored secret hash against a presented plaintext secret.
    ///
    /// # Arguments
    ///
    /// * `hashed` - The secret hash as stored in the client registration
    /// * `presented` - The plaintext secret presented by the client
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` only when the presented secret matches the hash.
    ///
    /// # Errors
    ///
    /// Returns `invalid_client` when the secret does not match or the stored
    /// hash cannot be parsed.
    async fn compare(&self, hashed: &str, presented: &str) -> AuthResult<()>;
}

/// Default Argon2id hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

#[async_trait]
impl SecretHasher for Argon2Hasher {
    async fn compare(&self, hashed: &str, presented: &str) -> AuthResult<()> {
        let parsed = PasswordHash::new(hashed).map_err(|e| {
            AuthError::invalid_client_debug("The provided client secret is invalid", e.to_string())
        })?;

        Argon2::default()
            .verify_password(presented.as_bytes(), &parsed)
            .map_err(|e| {
                AuthError::invalid_client_debug(
                    "The provided client secret is invalid",
                    e.to_string(),
                )
            })
    }
}

/// Generates a new cryptographically secure client secret.
///
/// The secret is a 256-bit (32 bytes) random value encoded as 64
/// hexadecimal characters.
///
/// # Example
///
/// ```
/// use oxidc_auth::secret::generate_client_secret;
///
/// let secret = generate_client_secret();
/// assert_eq!(secret.len(), 64);
/// ```
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Hashes a client secret for storage using Argon2id.
///
/// Uses Argon2id (hybrid mode) with:
/// - Cryptographically secure random salt (OsRng)
/// - Default parameters (memory cost, time cost, parallelism)
/// - PHC string format for storage
///
/// # Arguments
///
/// * `secret` - The plaintext client secret to hash
///
/// # Returns
///
/// PHC-formatted hash string suitable for database storage.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_client_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
