//! Assertion replay storage.
//!
//! This module defines the storage interface for tracking `jti` values from
//! verified client assertions so that an assertion can be accepted at most
//! once.
//!
//! # Security Considerations
//!
//! - JTIs must be stored with their expiration time
//! - Expired JTIs should be cleaned up periodically
//! - Storage should be persistent across server restarts
//! - Storage must tolerate concurrent access
//!
//! # Implementation Notes
//!
//! The protocol is a probe (`check`) followed by an insert (`store`),
//! ordered after every other claim validation. There is no atomicity across
//! the two calls, so two concurrent requests presenting the same `jti` may
//! both pass the probe. Backends that need strict single-use should
//! implement `store` as a conditional insert (insert-if-absent) and return
//! `AuthError::jti_known()` on conflict:
//!
//! ```sql
//! INSERT INTO used_jtis (jti, expires_at)
//! VALUES ($1, $2)
//! ON CONFLICT (jti) DO NOTHING
//! RETURNING jti
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;

/// Storage for JWT ID (`jti`) replay tracking.
///
/// This trait defines the interface for preventing assertion replay attacks
/// by tracking which `jti` values have already been used.
///
/// # Example Implementation
///
/// ```ignore
/// use oxidc_auth::AuthResult;
/// use oxidc_auth::error::AuthError;
/// use oxidc_auth::storage::JtiStorage;
/// use time::OffsetDateTime;
///
/// struct MemoryJtiStorage {
///     seen: std::sync::RwLock<std::collections::HashMap<String, OffsetDateTime>>,
/// }
///
/// #[async_trait::async_trait]
/// impl JtiStorage for MemoryJtiStorage {
///     async fn check(&self, jti: &str) -> AuthResult<()> {
///         let seen = self.seen.read().unwrap();
///         match seen.get(jti) {
///             Some(exp) if *exp > OffsetDateTime::now_utc() => Err(AuthError::jti_known()),
///             _ => Ok(()),
///         }
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait JtiStorage: Send + Sync {
    /// Checks whether `jti` has been seen before.
    ///
    /// # Arguments
    ///
    /// * `jti` - The JWT ID to probe
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` if the `jti` is unknown or its entry has expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::JtiKnown` if the `jti` is known and unexpired,
    /// or propagates the failure if the storage operation fails.
    async fn check(&self, jti: &str) -> AuthResult<()>;

    /// Records `jti` as used until `expires_at`.
    ///
    /// # Arguments
    ///
    /// * `jti` - The JWT ID to record
    /// * `expires_at` - When this entry can be cleaned up (matches the
    ///   assertion's `exp` claim)
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails; the caller must then
    /// abort authentication.
    async fn store(&self, jti: &str, expires_at: OffsetDateTime) -> AuthResult<()>;

    /// Deletes expired entries.
    ///
    /// Should be called periodically to prevent storage growth. Entries are
    /// removable at any time after their `expires_at` instant.
    ///
    /// # Returns
    ///
    /// Returns the number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}

/// In-memory replay store.
///
/// Suitable for tests and single-process deployments. Entries survive only
/// for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryJtiStore {
    seen: RwLock<HashMap<String, OffsetDateTime>>,
}

impl InMemoryJtiStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JtiStorage for InMemoryJtiStore {
    async fn check(&self, jti: &str) -> AuthResult<()> {
        let seen = self.seen.read().await;
        match seen.get(jti) {
            Some(expires_at) if *expires_at > OffsetDateTime::now_utc() => {
                Err(AuthError::jti_known())
            }
            _ => Ok(()),
        }
    }

    async fn store(&self, jti: &str, expires_at: OffsetDateTime) -> AuthResult<()> {
        let mut seen = self.seen.write().await;
        seen.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut seen = self.seen.write().await;
        let before = seen.len();
        seen.retain(|_, expires_at| *expires_at > now);
        Ok((before - seen.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[tokio::test]
    async fn test_unknown_jti_passes() {
        let store = InMemoryJtiStore::new();
        assert!(store.check("j-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_stored_jti_is_rejected() {
        let store = InMemoryJtiStore::new();
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(5);
        store.store("j-1", expires_at).await.unwrap();

        let err = store.check("j-1").await.unwrap_err();
        assert!(matches!(err, AuthError::JtiKnown { .. }));
    }

    #[tokio::test]
    async fn test_expired_jti_passes() {
        let store = InMemoryJtiStore::new();
        let expires_at = OffsetDateTime::now_utc() - Duration::minutes(5);
        store.store("j-1", expires_at).await.unwrap();

        assert!(store.check("j-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let store = InMemoryJtiStore::new();
        let now = OffsetDateTime::now_utc();
        store.store("old", now - Duration::minutes(5)).await.unwrap();
        store.store("new", now + Duration::minutes(5)).await.unwrap();

        let removed = store.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);

        assert!(store.check("old").await.is_ok());
        assert!(store.check("new").await.is_err());
    }
}
