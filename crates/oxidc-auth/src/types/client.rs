//! OAuth 2.0 client domain types.
//!
//! A [`Client`] is the registration record consumed by the authentication
//! core. Plain OAuth 2.0 clients carry no [`OidcRegistration`]; for them,
//! registered-method enforcement is skipped entirely.

use std::fmt;

use jsonwebtoken::jwk::JwkSet;
use serde::{Deserialize, Serialize};

// =============================================================================
// Token Endpoint Auth Method
// =============================================================================

/// Token endpoint client authentication methods.
///
/// Defined in OpenID Connect Core Section 9 and RFC 8705.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    /// No client authentication (public clients).
    None,

    /// Client secret via HTTP Basic Auth.
    ClientSecretBasic,

    /// Client secret in request body.
    ClientSecretPost,

    /// Client assertion JWT signed with the client secret (HMAC).
    /// Registered clients with this method are rejected; the server does not
    /// implement symmetric-secret assertions.
    ClientSecretJwt,

    /// Client assertion JWT signed with the client's private key.
    PrivateKeyJwt,

    /// TLS client certificate with subject matching.
    TlsClientAuth,
}

impl TokenEndpointAuthMethod {
    /// Returns the string representation of the auth method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
            Self::TlsClientAuth => "tls_client_auth",
        }
    }
}

impl fmt::Display for TokenEndpointAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client
// =============================================================================

/// OAuth 2.0 client registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Argon2-hashed client secret (for confidential clients).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_secret: Option<String>,

    /// Whether this is a public client (no secret, no credentials required).
    pub public: bool,

    /// OpenID Connect registration extension. Absent for plain OAuth 2.0
    /// clients, which skip registered-method enforcement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc: Option<OidcRegistration>,
}

/// OpenID Connect client registration metadata consumed by the
/// authentication core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcRegistration {
    /// Registered token endpoint authentication method.
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,

    /// Registered JWS algorithm for client assertions (e.g. "RS256").
    #[serde(default)]
    pub token_endpoint_auth_signing_alg: String,

    /// Inline JWKS holding the client's public keys. When set, the JWKS URI
    /// is never consulted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<JwkSet>,

    /// URI for fetching the client's public keys dynamically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// Certificate subject field used for `tls_client_auth`. Only "DN"
    /// (the entire Distinguished Name) is supported.
    #[serde(default)]
    pub certificate_subject_field: String,

    /// Expected certificate subject value for `tls_client_auth`.
    #[serde(default)]
    pub certificate_subject_value: String,
}

impl Client {
    /// Validates the client registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration is internally inconsistent.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if !self.public && self.hashed_secret.is_none() {
            let needs_secret = match &self.oidc {
                Some(oidc) => matches!(
                    oidc.token_endpoint_auth_method,
                    TokenEndpointAuthMethod::ClientSecretBasic
                        | TokenEndpointAuthMethod::ClientSecretPost
                ),
                Option::None => true,
            };
            if needs_secret {
                return Err(ClientValidationError::MissingSecret);
            }
        }

        if let Some(oidc) = &self.oidc
            && oidc.token_endpoint_auth_method == TokenEndpointAuthMethod::PrivateKeyJwt
            && oidc.jwks.is_none()
            && oidc.jwks_uri.as_deref().unwrap_or("").is_empty()
        {
            return Err(ClientValidationError::MissingJwks);
        }

        Ok(())
    }
}

/// Client registration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientValidationError {
    /// The client_id is empty.
    #[error("client_id must not be empty")]
    EmptyClientId,

    /// A confidential client using a shared-secret method has no secret.
    #[error("confidential client must have a hashed secret")]
    MissingSecret,

    /// A private_key_jwt client has neither an inline JWKS nor a JWKS URI.
    #[error("private_key_jwt client must register a JWKS or a JWKS URI")]
    MissingJwks,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confidential_client() -> Client {
        Client {
            client_id: "confidential-client".to_string(),
            hashed_secret: Some("$argon2id$fake".to_string()),
            public: false,
            oidc: None,
        }
    }

    #[test]
    fn test_auth_method_as_str() {
        assert_eq!(TokenEndpointAuthMethod::None.as_str(), "none");
        assert_eq!(
            TokenEndpointAuthMethod::ClientSecretBasic.as_str(),
            "client_secret_basic"
        );
        assert_eq!(
            TokenEndpointAuthMethod::ClientSecretPost.as_str(),
            "client_secret_post"
        );
        assert_eq!(
            TokenEndpointAuthMethod::ClientSecretJwt.as_str(),
            "client_secret_jwt"
        );
        assert_eq!(
            TokenEndpointAuthMethod::PrivateKeyJwt.as_str(),
            "private_key_jwt"
        );
        assert_eq!(
            TokenEndpointAuthMethod::TlsClientAuth.as_str(),
            "tls_client_auth"
        );
    }

    #[test]
    fn test_auth_method_serde_rename() {
        let method: TokenEndpointAuthMethod =
            serde_json::from_str("\"private_key_jwt\"").unwrap();
        assert_eq!(method, TokenEndpointAuthMethod::PrivateKeyJwt);
    }

    #[test]
    fn test_validate_ok() {
        assert!(confidential_client().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_client_id() {
        let mut client = confidential_client();
        client.client_id = String::new();
        assert_eq!(client.validate(), Err(ClientValidationError::EmptyClientId));
    }

    #[test]
    fn test_validate_missing_secret() {
        let mut client = confidential_client();
        client.hashed_secret = None;
        assert_eq!(client.validate(), Err(ClientValidationError::MissingSecret));
    }

    #[test]
    fn test_validate_private_key_jwt_needs_keys() {
        let client = Client {
            client_id: "backend".to_string(),
            hashed_secret: None,
            public: false,
            oidc: Some(OidcRegistration {
                token_endpoint_auth_method: TokenEndpointAuthMethod::PrivateKeyJwt,
                token_endpoint_auth_signing_alg: "RS256".to_string(),
                jwks: None,
                jwks_uri: None,
                certificate_subject_field: String::new(),
                certificate_subject_value: String::new(),
            }),
        };
        assert_eq!(client.validate(), Err(ClientValidationError::MissingJwks));
    }

    #[test]
    fn test_validate_private_key_jwt_with_jwks_uri() {
        let client = Client {
            client_id: "backend".to_string(),
            hashed_secret: None,
            public: false,
            oidc: Some(OidcRegistration {
                token_endpoint_auth_method: TokenEndpointAuthMethod::PrivateKeyJwt,
                token_endpoint_auth_signing_alg: "RS256".to_string(),
                jwks: None,
                jwks_uri: Some("https://client.example.com/jwks.json".to_string()),
                certificate_subject_field: String::new(),
                certificate_subject_value: String::new(),
            }),
        };
        assert!(client.validate().is_ok());
    }
}
