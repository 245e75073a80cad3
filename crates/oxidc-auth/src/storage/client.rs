//! Client storage trait.
//!
//! Defines the lookup interface for OAuth client registrations.
//! Implementations are provided by storage backends.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Storage operations for OAuth 2.0 clients.
///
/// # Example
///
/// ```ignore
/// use oxidc_auth::storage::ClientStorage;
///
/// async fn example(storage: &impl ClientStorage) {
///     if let Some(client) = storage.find_by_client_id("my-app").await? {
///         println!("found client {}", client.client_id);
///     }
/// }
/// ```
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Find a client by its OAuth client_id.
    ///
    /// Returns `None` if the client doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails or the request was
    /// cancelled.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>>;
}
