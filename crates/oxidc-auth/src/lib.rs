//! # oxidc-auth
//!
//! Token-endpoint client authentication core for the OxIDC authorization
//! server.
//!
//! This crate decides, for an incoming token-endpoint request, which OAuth 2.0
//! client is making it and whether that client has proven its identity under
//! the authentication method registered for it. It also shapes OpenID Connect
//! ID Token claim sets into the form downstream JWT signing expects.
//!
//! ## Authentication methods
//!
//! - `client_secret_basic` - client secret via HTTP Basic Auth
//! - `client_secret_post` - client secret in the request body
//! - `private_key_jwt` - signed JWT client assertion (RFC 7523)
//! - `tls_client_auth` - TLS client certificate subject matching
//! - `none` - public clients
//!
//! `client_secret_jwt` (symmetric-secret assertions) is deliberately not
//! implemented; such assertions are rejected.
//!
//! ## Modules
//!
//! - [`config`] - server-side configuration
//! - [`error`] - the `AuthError` taxonomy and OAuth 2.0 error codes
//! - [`jwks`] - client public key resolution (inline JWK Sets and remote URIs)
//! - [`oauth`] - credential extraction, method dispatch, assertion verification
//! - [`secret`] - client secret hashing and comparison
//! - [`storage`] - storage traits for clients and assertion replay tracking
//! - [`token`] - ID Token claim shaping
//! - [`types`] - client registration types

pub mod config;
pub mod error;
pub mod jwks;
pub mod oauth;
pub mod secret;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use jwks::{HttpJwksFetcher, JwksCacheConfig, JwksResolver, KeyFamily};
pub use oauth::{
    ClientAssertionClaims, ClientAssertionVerifier, ClientAuthenticator, StringOrArray,
    TokenEndpointRequest, TokenRequestForm, JWT_BEARER_ASSERTION_TYPE,
};
pub use secret::{Argon2Hasher, SecretHasher};
pub use storage::{ClientStorage, InMemoryJtiStore, JtiStorage};
pub use token::IdTokenClaims;
pub use types::{Client, ClientValidationError, OidcRegistration, TokenEndpointAuthMethod};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use oxidc_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::AuthError;
    pub use crate::jwks::{HttpJwksFetcher, JwksCacheConfig, JwksResolver, KeyFamily};
    pub use crate::oauth::{
        ClientAssertionClaims, ClientAssertionVerifier, ClientAuthenticator, StringOrArray,
        TokenEndpointRequest, TokenRequestForm, JWT_BEARER_ASSERTION_TYPE,
    };
    pub use crate::secret::{Argon2Hasher, SecretHasher};
    pub use crate::storage::{ClientStorage, InMemoryJtiStore, JtiStorage};
    pub use crate::token::IdTokenClaims;
    pub use crate::types::{Client, ClientValidationError, OidcRegistration, TokenEndpointAuthMethod};
}
