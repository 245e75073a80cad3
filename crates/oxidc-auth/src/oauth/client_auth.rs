//! Client authentication for the token endpoint.
//!
//! A single entry point decides which authentication method the request is
//! attempting and rejects combinations that do not match the client's
//! registered method.
//!
//! # Dispatch Order
//!
//! 1. A present `client_assertion_type` selects the assertion path; any
//!    value other than the RFC 7523 JWT bearer URN is rejected
//! 2. A TLS peer certificate selects the mTLS path
//! 3. Otherwise credentials are extracted from the HTTP Basic header or the
//!    form body and compared against the registered secret
//!
//! Clients without an OpenID Connect registration skip registered-method
//! enforcement for interoperability with plain OAuth 2.0 clients.

use std::sync::Arc;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::jwks::JwksResolver;
use crate::oauth::client_assertion::{ClientAssertionVerifier, JWT_BEARER_ASSERTION_TYPE};
use crate::oauth::mtls::authenticate_tls_client;
use crate::oauth::request::{TokenEndpointRequest, extract_client_credentials};
use crate::secret::SecretHasher;
use crate::storage::{ClientStorage, JtiStorage};
use crate::types::{Client, TokenEndpointAuthMethod};

/// Authenticates clients at the token endpoint.
///
/// # Example
///
/// ```ignore
/// use oxidc_auth::oauth::ClientAuthenticator;
///
/// let authenticator = ClientAuthenticator::new(config, clients, hasher, jtis, keys);
/// let client = authenticator.authenticate(&request).await?;
/// ```
pub struct ClientAuthenticator {
    clients: Arc<dyn ClientStorage>,
    hasher: Arc<dyn SecretHasher>,
    assertions: ClientAssertionVerifier,
}

impl ClientAuthenticator {
    /// Creates a new authenticator.
    pub fn new(
        config: AuthConfig,
        clients: Arc<dyn ClientStorage>,
        hasher: Arc<dyn SecretHasher>,
        jtis: Arc<dyn JtiStorage>,
        keys: Arc<dyn JwksResolver>,
    ) -> Self {
        let assertions =
            ClientAssertionVerifier::new(config, Arc::clone(&clients), jtis, keys);
        Self {
            clients,
            hasher,
            assertions,
        }
    }

    /// Authenticates the client making this token-endpoint request.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for malformed input, `invalid_client` when
    /// the client cannot be authenticated, and propagates storage errors.
    pub async fn authenticate(&self, request: &TokenEndpointRequest) -> AuthResult<Client> {
        if let Some(assertion_type) = request.form.client_assertion_type.as_deref()
            && !assertion_type.is_empty()
        {
            if assertion_type != JWT_BEARER_ASSERTION_TYPE {
                return Err(AuthError::invalid_request(format!(
                    "Unknown client_assertion_type '{}'",
                    assertion_type
                )));
            }
            if request.form.client_assertion.as_deref().unwrap_or("").is_empty() {
                return Err(AuthError::invalid_request(format!(
                    "The 'client_assertion' request parameter must be set when using 'client_assertion_type' of '{}'",
                    JWT_BEARER_ASSERTION_TYPE
                )));
            }
            return self.assertions.verify(request).await;
        }

        if request.has_peer_certificate() {
            return authenticate_tls_client(request, self.clients.as_ref()).await;
        }

        self.authenticate_shared_secret(request).await
    }

    /// Shared-secret (or public-client) authentication.
    async fn authenticate_shared_secret(
        &self,
        request: &TokenEndpointRequest,
    ) -> AuthResult<Client> {
        let (client_id, client_secret) = extract_client_credentials(request, true)?;
        let client = lookup_client(self.clients.as_ref(), &client_id).await?;

        if let Some(oidc) = client.oidc.as_ref() {
            let method = oidc.token_endpoint_auth_method;

            let body_id = request.form.client_id.as_deref().unwrap_or("");
            let body_secret = request.form.client_secret.as_deref().unwrap_or("");
            if !body_id.is_empty()
                && !body_secret.is_empty()
                && method != TokenEndpointAuthMethod::ClientSecretPost
            {
                return Err(AuthError::invalid_client(format!(
                    "This client supports client authentication method '{}', but method 'client_secret_post' was requested",
                    method
                )));
            }

            if request.basic_credentials()?.is_some()
                && method != TokenEndpointAuthMethod::ClientSecretBasic
            {
                return Err(AuthError::invalid_client(format!(
                    "This client supports client authentication method '{}', but method 'client_secret_basic' was requested",
                    method
                )));
            }

            if client.public && method != TokenEndpointAuthMethod::None {
                return Err(AuthError::invalid_client(format!(
                    "This client supports client authentication method '{}', but method 'none' was requested",
                    method
                )));
            }
        }

        if client.public {
            return Ok(client);
        }

        let hashed = client.hashed_secret.clone().ok_or_else(|| {
            AuthError::invalid_client("This client has no client secret registered")
        })?;

        match self.hasher.compare(&hashed, &client_secret).await {
            Ok(()) => Ok(client),
            Err(err @ AuthError::InvalidClient { .. }) => Err(err),
            Err(other) => Err(AuthError::invalid_client_debug(
                "The provided client secret is invalid",
                other.to_string(),
            )),
        }
    }
}

/// Resolves a client from the store, mapping lookup failures to
/// `invalid_client`.
pub(crate) async fn lookup_client(
    clients: &dyn ClientStorage,
    client_id: &str,
) -> AuthResult<Client> {
    clients
        .find_by_client_id(client_id)
        .await
        .map_err(|e| {
            AuthError::invalid_client_debug(
                "The requested OAuth 2.0 Client could not be looked up",
                e.to_string(),
            )
        })?
        .ok_or_else(|| AuthError::invalid_client("The requested OAuth 2.0 Client does not exist"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::request::TokenRequestForm;
    use crate::storage::InMemoryJtiStore;
    use crate::types::OidcRegistration;
    use async_trait::async_trait;
    use jsonwebtoken::jwk::JwkSet;
    use std::collections::HashMap;

    struct MockClientStorage {
        clients: HashMap<String, Client>,
    }

    impl MockClientStorage {
        fn with(clients: Vec<Client>) -> Self {
            Self {
                clients: clients
                    .into_iter()
                    .map(|c| (c.client_id.clone(), c))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl ClientStorage for MockClientStorage {
        async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
            Ok(self.clients.get(client_id).cloned())
        }
    }

    /// Plaintext comparison stand-in for the Argon2 hasher.
    struct PlaintextHasher;

    #[async_trait]
    impl SecretHasher for PlaintextHasher {
        async fn compare(&self, hashed: &str, presented: &str) -> AuthResult<()> {
            if hashed == presented {
                Ok(())
            } else {
                Err(AuthError::invalid_client(
                    "The provided client secret is invalid",
                ))
            }
        }
    }

    struct NoNetworkResolver;

    #[async_trait]
    impl JwksResolver for NoNetworkResolver {
        async fn resolve(&self, _jwks_uri: &str, _force_refresh: bool) -> AuthResult<JwkSet> {
            Err(AuthError::storage("no network in tests"))
        }
    }

    fn authenticator_for(clients: Vec<Client>) -> ClientAuthenticator {
        ClientAuthenticator::new(
            AuthConfig::new("https://as.example/token"),
            Arc::new(MockClientStorage::with(clients)),
            Arc::new(PlaintextHasher),
            Arc::new(InMemoryJtiStore::new()),
            Arc::new(NoNetworkResolver),
        )
    }

    fn public_client() -> Client {
        Client {
            client_id: "public-client".to_string(),
            hashed_secret: None,
            public: true,
            oidc: None,
        }
    }

    fn confidential_client(method: TokenEndpointAuthMethod) -> Client {
        Client {
            client_id: "confidential-client".to_string(),
            hashed_secret: Some("correct-secret".to_string()),
            public: false,
            oidc: Some(OidcRegistration {
                token_endpoint_auth_method: method,
                token_endpoint_auth_signing_alg: String::new(),
                jwks: None,
                jwks_uri: None,
                certificate_subject_field: String::new(),
                certificate_subject_value: String::new(),
            }),
        }
    }

    fn post_request(client_id: &str, client_secret: Option<&str>) -> TokenEndpointRequest {
        TokenEndpointRequest {
            form: TokenRequestForm {
                client_id: Some(client_id.to_string()),
                client_secret: client_secret.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_authenticate_public_client() {
        let authenticator = authenticator_for(vec![public_client()]);
        let request = post_request("public-client", None);

        let client = authenticator.authenticate(&request).await.unwrap();
        assert_eq!(client.client_id, "public-client");
    }

    #[tokio::test]
    async fn test_authenticate_secret_post() {
        let authenticator = authenticator_for(vec![confidential_client(
            TokenEndpointAuthMethod::ClientSecretPost,
        )]);
        let request = post_request("confidential-client", Some("correct-secret"));

        let client = authenticator.authenticate(&request).await.unwrap();
        assert_eq!(client.client_id, "confidential-client");
    }

    #[tokio::test]
    async fn test_authenticate_basic_auth() {
        let authenticator = authenticator_for(vec![{
            let mut c = confidential_client(TokenEndpointAuthMethod::ClientSecretBasic);
            c.client_id = "acme".to_string();
            c
        }]);
        // "acme:correct-secret" base64 encoded
        let request = TokenEndpointRequest {
            authorization: Some("Basic YWNtZTpjb3JyZWN0LXNlY3JldA==".to_string()),
            ..Default::default()
        };

        let client = authenticator.authenticate(&request).await.unwrap();
        assert_eq!(client.client_id, "acme");
    }

    #[tokio::test]
    async fn test_body_credentials_with_basic_registration_rejected() {
        // Client registered client_secret_basic, request sends credentials
        // in the form body.
        let authenticator = authenticator_for(vec![confidential_client(
            TokenEndpointAuthMethod::ClientSecretBasic,
        )]);
        let request = post_request("confidential-client", Some("correct-secret"));

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClient { .. }));
        assert!(err.hint().contains("client_secret_basic"));
    }

    #[tokio::test]
    async fn test_basic_credentials_with_post_registration_rejected() {
        let authenticator = authenticator_for(vec![{
            let mut c = confidential_client(TokenEndpointAuthMethod::ClientSecretPost);
            c.client_id = "acme".to_string();
            c
        }]);
        let request = TokenEndpointRequest {
            authorization: Some("Basic YWNtZTpjb3JyZWN0LXNlY3JldA==".to_string()),
            ..Default::default()
        };

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClient { .. }));
        assert!(err.hint().contains("client_secret_post"));
    }

    #[tokio::test]
    async fn test_public_client_with_non_none_method_rejected() {
        let mut client = confidential_client(TokenEndpointAuthMethod::ClientSecretBasic);
        client.public = true;
        client.client_id = "public-oidc".to_string();
        let authenticator = authenticator_for(vec![client]);
        let request = post_request("public-oidc", None);

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClient { .. }));
    }

    #[tokio::test]
    async fn test_plain_oauth_client_skips_method_checks() {
        // No OIDC registration: body credentials are accepted even without a
        // registered client_secret_post method.
        let client = Client {
            client_id: "legacy".to_string(),
            hashed_secret: Some("correct-secret".to_string()),
            public: false,
            oidc: None,
        };
        let authenticator = authenticator_for(vec![client]);
        let request = post_request("legacy", Some("correct-secret"));

        assert!(authenticator.authenticate(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let authenticator = authenticator_for(vec![confidential_client(
            TokenEndpointAuthMethod::ClientSecretPost,
        )]);
        let request = post_request("confidential-client", Some("wrong-secret"));

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClient { .. }));
    }

    #[tokio::test]
    async fn test_unknown_client_rejected() {
        let authenticator = authenticator_for(vec![]);
        let request = post_request("ghost", Some("secret"));

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClient { .. }));
    }

    #[tokio::test]
    async fn test_no_credentials_is_invalid_request() {
        let authenticator = authenticator_for(vec![]);
        let request = TokenEndpointRequest::default();

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_unknown_assertion_type_is_invalid_request() {
        let authenticator = authenticator_for(vec![]);
        let request = TokenEndpointRequest {
            form: TokenRequestForm {
                client_assertion_type: Some("urn:example:unknown".to_string()),
                client_assertion: Some("x.y.z".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
        assert!(err.hint().contains("urn:example:unknown"));
    }

    #[tokio::test]
    async fn test_assertion_type_without_assertion_is_invalid_request() {
        let authenticator = authenticator_for(vec![]);
        let request = TokenEndpointRequest {
            form: TokenRequestForm {
                client_assertion_type: Some(JWT_BEARER_ASSERTION_TYPE.to_string()),
                client_assertion: None,
                ..Default::default()
            },
            ..Default::default()
        };

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
        assert!(err.hint().contains("client_assertion"));
    }

    #[tokio::test]
    async fn test_peer_certificate_selects_mtls_path() {
        // Certificate present but unparseable, and the client is registered
        // for tls_client_auth: the request must be routed to the mTLS path
        // rather than shared-secret validation.
        let mut client = confidential_client(TokenEndpointAuthMethod::TlsClientAuth);
        let oidc = client.oidc.as_mut().unwrap();
        oidc.certificate_subject_field = "DN".to_string();
        oidc.certificate_subject_value = "CN=whatever".to_string();
        let authenticator = authenticator_for(vec![client]);

        let mut request = post_request("confidential-client", None);
        request.peer_certificates = vec![vec![0x00, 0x01]];

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(err.hint().contains("certificate"));
    }

    #[tokio::test]
    async fn test_missing_secret_registration_rejected() {
        let mut client = confidential_client(TokenEndpointAuthMethod::ClientSecretPost);
        client.hashed_secret = None;
        let authenticator = authenticator_for(vec![client]);
        let request = post_request("confidential-client", Some("anything"));

        let err = authenticator.authenticate(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClient { .. }));
    }
}
