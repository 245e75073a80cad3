//! Client public key resolution for assertion verification.
//!
//! Keys come from the client registration, either as an inline JWK Set or
//! via a remote JWKS URI resolved through a [`JwksResolver`]. When a client
//! rotates keys, a cached key set may lag behind; the remote path therefore
//! looks up the cached set first and retries once with a forced refresh
//! before giving up.

mod http;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, PublicKeyUse};

pub use http::{HttpJwksFetcher, JwksCacheConfig};

use crate::AuthResult;
use crate::error::AuthError;
use crate::types::OidcRegistration;

/// Asymmetric key family required to verify a client assertion.
///
/// RSA-PSS algorithms verify against RSA keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// RSA keys (RS256/RS384/RS512 and PS256/PS384/PS512).
    Rsa,
    /// Elliptic curve keys (ES256/ES384).
    Ecdsa,
}

impl KeyFamily {
    /// Returns the JWK `kty` name for this family.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ecdsa => "ECDSA",
        }
    }

    fn matches(&self, key: &Jwk) -> bool {
        match self {
            Self::Rsa => matches!(key.algorithm, AlgorithmParameters::RSA(_)),
            Self::Ecdsa => matches!(key.algorithm, AlgorithmParameters::EllipticCurve(_)),
        }
    }
}

/// Resolves a JWK Set from a remote URI.
///
/// Expected to be a process-wide cache shared across requests. When
/// `force_refresh` is set, any cached copy must be bypassed.
#[async_trait]
pub trait JwksResolver: Send + Sync {
    /// Resolves the JWK Set published at `jwks_uri`.
    ///
    /// # Errors
    ///
    /// Returns an error if the set cannot be fetched or parsed.
    async fn resolve(&self, jwks_uri: &str, force_refresh: bool) -> AuthResult<JwkSet>;
}

/// Finds a verification key in `jwks`.
///
/// When `kid` is set, the candidate set is restricted to keys with that
/// identifier before filtering. Keys must declare `use = "sig"` and belong
/// to the requested family.
///
/// # Errors
///
/// Returns `invalid_request` if the set is empty or no key matches.
pub fn find_verification_key<'a>(
    jwks: &'a JwkSet,
    kid: Option<&str>,
    family: KeyFamily,
) -> AuthResult<&'a Jwk> {
    if jwks.keys.is_empty() {
        return Err(AuthError::invalid_request(
            "The retrieved JWK Set does not contain any keys",
        ));
    }

    jwks.keys
        .iter()
        .filter(|key| match kid {
            Some(expected) => key.common.key_id.as_deref() == Some(expected),
            None => true,
        })
        .find(|key| {
            key.common.public_key_use == Some(PublicKeyUse::Signature) && family.matches(key)
        })
        .ok_or_else(|| match kid {
            Some(kid) => AuthError::invalid_request(format!(
                "Unable to find {} public key with use='sig' for kid '{}' in JWK Set",
                family.as_str(),
                kid
            )),
            None => AuthError::invalid_request(format!(
                "Unable to find {} public key with use='sig' in JWK Set",
                family.as_str()
            )),
        })
}

/// Resolves the verification key for a client assertion.
///
/// An inline JWK Set takes precedence; the JWKS URI is never consulted when
/// one is present. For the remote path, a cached lookup strictly precedes
/// the forced refresh.
///
/// # Errors
///
/// Returns `invalid_client` if the client registers no key material, and
/// `invalid_request` if no suitable key can be found.
pub async fn resolve_verification_key(
    registration: &OidcRegistration,
    resolver: &dyn JwksResolver,
    kid: Option<&str>,
    family: KeyFamily,
) -> AuthResult<DecodingKey> {
    if let Some(jwks) = &registration.jwks {
        let key = find_verification_key(jwks, kid, family)?;
        return to_decoding_key(key);
    }

    let jwks_uri = registration.jwks_uri.as_deref().unwrap_or("");
    if jwks_uri.is_empty() {
        return Err(AuthError::invalid_client(
            "The client has neither an inline JWKS nor a JWKS URI registered",
        ));
    }

    let jwks = resolver.resolve(jwks_uri, false).await?;
    match find_verification_key(&jwks, kid, family) {
        Ok(key) => to_decoding_key(key),
        Err(_) => {
            // The cached set may predate a client key rotation.
            let jwks = resolver.resolve(jwks_uri, true).await?;
            let key = find_verification_key(&jwks, kid, family)?;
            to_decoding_key(key)
        }
    }
}

fn to_decoding_key(key: &Jwk) -> AuthResult<DecodingKey> {
    DecodingKey::from_jwk(key).map_err(|e| {
        AuthError::invalid_client_debug("Invalid JWK in client key set", e.to_string())
    })
}
