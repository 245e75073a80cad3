//! OAuth 2.0 token-endpoint client authentication.
//!
//! # Authentication Methods
//!
//! - `none` - public clients (no authentication)
//! - `client_secret_basic` - HTTP Basic Auth with client_id:client_secret
//! - `client_secret_post` - client_id and client_secret in request body
//! - `private_key_jwt` - client assertion JWT (RFC 7523)
//! - `tls_client_auth` - TLS client certificate subject matching
//!
//! # Dispatch Order
//!
//! 1. A `client_assertion_type` parameter selects the assertion path
//! 2. A TLS peer certificate selects the mTLS path
//! 3. Otherwise shared-secret (or public-client) authentication applies

mod client_assertion;
mod client_auth;
mod mtls;
mod request;

pub use client_assertion::{
    ClientAssertionClaims, ClientAssertionVerifier, StringOrArray, JWT_BEARER_ASSERTION_TYPE,
};
pub use client_auth::ClientAuthenticator;
pub use mtls::authenticate_tls_client;
pub use request::{
    extract_client_credentials, parse_basic_auth, TokenEndpointRequest, TokenRequestForm,
};
