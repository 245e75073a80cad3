//! JWT client assertion verification (RFC 7523, `private_key_jwt`).
//!
//! A client assertion must contain:
//!
//! - `iss` (issuer): must equal the client_id
//! - `sub` (subject): must equal the client_id
//! - `aud` (audience): must contain this server's token endpoint URL
//! - `exp` (expiration): enforced by the JWT library
//! - `jti` (JWT ID): must be unique; tracked to prevent replays
//! - `iat`, `nbf`: optional
//!
//! The verification key is a function of the client named by the claims, so
//! the claims are peeked (unverified) to resolve the client before any key
//! material is touched. The replay record is written only after every other
//! check has passed; a malformed assertion never leaves a `jti` mark.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::jwks::{JwksResolver, KeyFamily, resolve_verification_key};
use crate::oauth::client_auth::lookup_client;
use crate::oauth::request::TokenEndpointRequest;
use crate::storage::{ClientStorage, JtiStorage};
use crate::types::{Client, TokenEndpointAuthMethod};

/// The client assertion type URN for JWT bearer assertions (RFC 7523).
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Claims of a client assertion JWT.
///
/// Fields are optional so that presence can be validated explicitly with
/// precise errors; unknown claims land in `extra`. Numeric dates are kept as
/// raw JSON numbers because clients emit both integer and floating-point
/// encodings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAssertionClaims {
    /// Issuer; must be the client_id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject; must be the client_id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience; must contain the token endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<StringOrArray>,

    /// JWT ID; must be unique per assertion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Expiration time as seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<serde_json::Number>,

    /// Issued-at time as seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<serde_json::Number>,

    /// Not-before time as seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<serde_json::Number>,

    /// Any further claims.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Audience claim: a single string or an ordered sequence of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrArray {
    /// Single string audience.
    String(String),
    /// Ordered audience list.
    Array(Vec<String>),
}

impl StringOrArray {
    /// Checks if the audience contains the specified value.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::String(s) => s == value,
            Self::Array(arr) => arr.iter().any(|s| s == value),
        }
    }
}

/// Verifies JWT client assertions for the `private_key_jwt` method.
///
/// # Example
///
/// ```ignore
/// use oxidc_auth::oauth::ClientAssertionVerifier;
///
/// let verifier = ClientAssertionVerifier::new(config, clients, jtis, keys);
/// let client = verifier.verify(&request).await?;
/// ```
pub struct ClientAssertionVerifier {
    config: AuthConfig,
    clients: Arc<dyn ClientStorage>,
    jtis: Arc<dyn JtiStorage>,
    keys: Arc<dyn JwksResolver>,
}

impl ClientAssertionVerifier {
    /// Creates a new verifier.
    pub fn new(
        config: AuthConfig,
        clients: Arc<dyn ClientStorage>,
        jtis: Arc<dyn JtiStorage>,
        keys: Arc<dyn JwksResolver>,
    ) -> Self {
        Self {
            config,
            clients,
            jtis,
            keys,
        }
    }

    /// Verifies the request's client assertion and returns the authenticated
    /// client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The assertion cannot be parsed
    /// - The client is unknown, not OIDC-capable, or not registered for
    ///   `private_key_jwt`
    /// - The signing algorithm differs from the registered one
    /// - No suitable verification key can be resolved
    /// - The signature or the claims are invalid
    /// - The `jti` has already been used
    pub async fn verify(&self, request: &TokenEndpointRequest) -> AuthResult<Client> {
        let assertion = request.form.client_assertion.as_deref().unwrap_or("");
        if assertion.is_empty() {
            return Err(AuthError::invalid_request(
                "The 'client_assertion' request parameter must be set",
            ));
        }

        // The form's client_id is authoritative when present; otherwise the
        // assertion's (unverified) `sub` claim names the client.
        let client_id = match request.form.client_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => peek_subject(assertion)?,
        };

        let client = lookup_client(self.clients.as_ref(), &client_id).await?;

        let Some(oidc) = client.oidc.as_ref() else {
            return Err(AuthError::invalid_request(
                "The server configuration does not support OpenID Connect specific authentication methods",
            ));
        };

        match oidc.token_endpoint_auth_method {
            TokenEndpointAuthMethod::PrivateKeyJwt => {}
            TokenEndpointAuthMethod::None => {
                return Err(AuthError::invalid_client(
                    "This client does not support client authentication, but a client assertion was provided",
                ));
            }
            TokenEndpointAuthMethod::ClientSecretPost => {
                return Err(AuthError::invalid_client(
                    "This client supports client authentication method 'client_secret_post', but a client assertion was provided",
                ));
            }
            TokenEndpointAuthMethod::ClientSecretBasic => {
                return Err(AuthError::invalid_client(
                    "This client supports client authentication method 'client_secret_basic', but a client assertion was provided",
                ));
            }
            other => {
                return Err(AuthError::invalid_client(format!(
                    "This client only supports client authentication method '{}', however that method is not supported by this server",
                    other
                )));
            }
        }

        let header = peek_header(assertion)?;
        if header.alg != oidc.token_endpoint_auth_signing_alg {
            return Err(AuthError::invalid_client(format!(
                "The 'client_assertion' is signed with '{}', but the client registered '{}'",
                header.alg, oidc.token_endpoint_auth_signing_alg
            )));
        }

        let (algorithm, family) = signing_algorithm(&header.alg)?;

        let decoding_key = resolve_verification_key(
            oidc,
            self.keys.as_ref(),
            header.kid.as_deref(),
            family,
        )
        .await?;

        let mut validation = Validation::new(algorithm);
        // The audience is matched manually below so the error can cite the
        // expected token endpoint URL.
        validation.validate_aud = false;
        validation.validate_nbf = true;

        let token = decode::<ClientAssertionClaims>(assertion, &decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("client assertion validation failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature
                    | ErrorKind::ImmatureSignature
                    | ErrorKind::MissingRequiredClaim(_) => AuthError::invalid_client_debug(
                        "Unable to validate the claims of the 'client_assertion'; check whether 'exp' is set and in the future",
                        e.to_string(),
                    ),
                    _ => AuthError::invalid_client_debug(
                        "Unable to verify the integrity of the 'client_assertion' value",
                        e.to_string(),
                    ),
                }
            })?;
        let claims = token.claims;

        if claims.iss.as_deref() != Some(client_id.as_str()) {
            return Err(AuthError::invalid_client(
                "Claim 'iss' from 'client_assertion' must match the 'client_id' of the OAuth 2.0 Client",
            ));
        }

        if self.config.token_endpoint.is_empty() {
            return Err(AuthError::misconfiguration(
                "The authorization server's token endpoint URL has not been configured",
            ));
        }

        if claims.sub.as_deref() != Some(client_id.as_str()) {
            return Err(AuthError::invalid_client(
                "Claim 'sub' from 'client_assertion' must match the 'client_id' of the OAuth 2.0 Client",
            ));
        }

        let jti = match claims.jti.as_deref() {
            Some(jti) if !jti.is_empty() => jti,
            _ => {
                return Err(AuthError::invalid_client(
                    "Claim 'jti' from 'client_assertion' must be set but is not",
                ));
            }
        };

        let audience_ok = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.config.token_endpoint));
        if !audience_ok {
            return Err(AuthError::invalid_client(format!(
                "Claim 'aud' from 'client_assertion' must match the authorization server's token endpoint '{}'",
                self.config.token_endpoint
            )));
        }

        // The replay record is part of the authentication transaction: a
        // probe failure or a failed insert aborts authentication.
        self.jtis.check(jti).await?;
        let expires_at = expiry_from_claims(&claims)?;
        self.jtis.store(jti, expires_at).await?;

        Ok(client)
    }
}

/// Minimal JOSE header of a client assertion.
#[derive(Debug, Deserialize)]
struct AssertionHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

fn split_jwt(assertion: &str) -> AuthResult<(&str, &str)> {
    let parts: Vec<&str> = assertion.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::invalid_client(
            "The 'client_assertion' is not a well-formed JWT",
        ));
    }
    Ok((parts[0], parts[1]))
}

/// Extracts the signing algorithm and key id from an unverified JWT header.
fn peek_header(assertion: &str) -> AuthResult<AssertionHeader> {
    let (header, _) = split_jwt(assertion)?;

    let header_bytes = URL_SAFE_NO_PAD.decode(header).map_err(|_| {
        AuthError::invalid_client("The 'client_assertion' header is not valid base64url")
    })?;

    serde_json::from_slice(&header_bytes)
        .map_err(|_| AuthError::invalid_client("The 'client_assertion' header is not valid JSON"))
}

/// Extracts the `sub` claim from an unverified JWT payload.
///
/// This does NOT verify the signature; it only determines which client's key
/// material to resolve.
fn peek_subject(assertion: &str) -> AuthResult<String> {
    let (_, payload) = split_jwt(assertion)?;

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| {
        AuthError::invalid_client("The 'client_assertion' payload is not valid base64url")
    })?;

    #[derive(Deserialize)]
    struct MinimalClaims {
        #[serde(default)]
        sub: Option<serde_json::Value>,
    }

    let claims: MinimalClaims = serde_json::from_slice(&payload_bytes).map_err(|_| {
        AuthError::invalid_client("The 'client_assertion' payload is not valid JSON")
    })?;

    match claims.sub {
        Some(serde_json::Value::String(sub)) => Ok(sub),
        _ => Err(AuthError::invalid_client(
            "The claim 'sub' from the 'client_assertion' is undefined",
        )),
    }
}

/// Maps a JWS algorithm name to the library algorithm and the key family it
/// verifies against.
fn signing_algorithm(alg: &str) -> AuthResult<(Algorithm, KeyFamily)> {
    match alg {
        "RS256" => Ok((Algorithm::RS256, KeyFamily::Rsa)),
        "RS384" => Ok((Algorithm::RS384, KeyFamily::Rsa)),
        "RS512" => Ok((Algorithm::RS512, KeyFamily::Rsa)),
        "PS256" => Ok((Algorithm::PS256, KeyFamily::Rsa)),
        "PS384" => Ok((Algorithm::PS384, KeyFamily::Rsa)),
        "PS512" => Ok((Algorithm::PS512, KeyFamily::Rsa)),
        "ES256" => Ok((Algorithm::ES256, KeyFamily::Ecdsa)),
        "ES384" => Ok((Algorithm::ES384, KeyFamily::Ecdsa)),
        "HS256" | "HS384" | "HS512" => Err(AuthError::invalid_client(
            "This server does not support client authentication method 'client_secret_jwt'",
        )),
        other => Err(AuthError::invalid_client(format!(
            "Unsupported client assertion signing algorithm '{}'",
            other
        ))),
    }
}

/// Reads the replay-record expiry from the `exp` claim.
///
/// The claim is accepted in both integer and floating-point encodings. The
/// JWT library has already enforced expiry at this point, so a missing or
/// unreadable `exp` is unexpected, but it still maps to an error rather
/// than a panic.
fn expiry_from_claims(claims: &ClientAssertionClaims) -> AuthResult<OffsetDateTime> {
    let number = claims.exp.as_ref().ok_or_else(|| {
        AuthError::invalid_client("Claim 'exp' from 'client_assertion' is missing")
    })?;

    let seconds = if let Some(seconds) = number.as_i64() {
        seconds
    } else if let Some(seconds) = number.as_f64() {
        seconds as i64
    } else {
        return Err(AuthError::invalid_client(
            "Claim 'exp' from 'client_assertion' is not a valid number",
        ));
    };

    OffsetDateTime::from_unix_timestamp(seconds).map_err(|_| {
        AuthError::invalid_client("Claim 'exp' from 'client_assertion' is out of range")
    })
}
