//! Token-endpoint request model and credential extraction.
//!
//! The core is transport-neutral: the HTTP layer hands over the raw
//! `Authorization` header value, the decoded form parameters it recognizes,
//! and the DER-encoded TLS peer certificate chain (leaf first), and this
//! module pulls candidate client credentials out of them.

use base64::{Engine, engine::general_purpose::STANDARD};
use percent_encoding::percent_decode_str;
use serde::Deserialize;

use crate::AuthResult;
use crate::error::AuthError;

/// Form parameters recognized by the client authentication core.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequestForm {
    /// OAuth 2.0 client identifier.
    pub client_id: Option<String>,

    /// Client secret (for `client_secret_post`).
    pub client_secret: Option<String>,

    /// Client assertion type URN.
    pub client_assertion_type: Option<String>,

    /// Client assertion JWT.
    pub client_assertion: Option<String>,
}

/// A token-endpoint request as seen by the authentication core.
#[derive(Debug, Clone, Default)]
pub struct TokenEndpointRequest {
    /// Raw `Authorization` header value, if present.
    pub authorization: Option<String>,

    /// Parsed form body.
    pub form: TokenRequestForm,

    /// DER-encoded TLS peer certificate chain, leaf first. Empty when the
    /// transport provided no client certificate.
    pub peer_certificates: Vec<Vec<u8>>,
}

impl TokenEndpointRequest {
    /// Returns `true` iff the transport provided at least one peer
    /// certificate. This is the sole gate on attempting mTLS authentication.
    #[must_use]
    pub fn has_peer_certificate(&self) -> bool {
        !self.peer_certificates.is_empty()
    }

    /// Parses HTTP Basic credentials from the `Authorization` header.
    ///
    /// Returns `Ok(None)` when the header is absent or uses another scheme.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for a malformed Basic header.
    pub fn basic_credentials(&self) -> AuthResult<Option<(String, String)>> {
        match &self.authorization {
            Some(header) => parse_basic_auth(header),
            None => Ok(None),
        }
    }
}

/// Parses an HTTP Basic Auth header value.
///
/// The userid and password are form-urlencoded per RFC 6749 Section 2.3.1
/// and are percent-decoded here.
///
/// # Errors
///
/// Returns `invalid_request` if the header carries the Basic scheme but the
/// credentials cannot be decoded.
pub fn parse_basic_auth(header_value: &str) -> AuthResult<Option<(String, String)>> {
    let header_value = header_value.trim();

    let Some(encoded) = header_value.strip_prefix("Basic ") else {
        return Ok(None);
    };

    let decoded = STANDARD.decode(encoded).map_err(|e| {
        AuthError::invalid_request_debug(
            "HTTP Authorization header is malformed: invalid Base64",
            e.to_string(),
        )
    })?;
    let credentials = String::from_utf8(decoded).map_err(|e| {
        AuthError::invalid_request_debug(
            "HTTP Authorization header is malformed: invalid UTF-8",
            e.to_string(),
        )
    })?;

    // Split on the first colon; the password may contain colons.
    let (userid, password) = credentials.split_once(':').ok_or_else(|| {
        AuthError::invalid_request(
            "HTTP Authorization header is malformed: missing ':' separator",
        )
    })?;

    let client_id = percent_decode_str(userid)
        .decode_utf8()
        .map_err(|e| {
            AuthError::invalid_request_debug(
                "Client credentials in the HTTP Authorization header could not be decoded",
                e.to_string(),
            )
        })?
        .into_owned();
    let client_secret = percent_decode_str(password)
        .decode_utf8()
        .map_err(|e| {
            AuthError::invalid_request_debug(
                "Client credentials in the HTTP Authorization header could not be decoded",
                e.to_string(),
            )
        })?
        .into_owned();

    Ok(Some((client_id, client_secret)))
}

/// Extracts shared-secret client credentials from the request.
///
/// The HTTP Basic header takes precedence over the form body.
///
/// # Errors
///
/// Returns `invalid_request` if the Basic header is malformed, or if
/// `require_id` is set and no client_id was found anywhere.
pub fn extract_client_credentials(
    request: &TokenEndpointRequest,
    require_id: bool,
) -> AuthResult<(String, String)> {
    let (client_id, client_secret) = match request.basic_credentials()? {
        Some(credentials) => credentials,
        None => (
            request.form.client_id.clone().unwrap_or_default(),
            request.form.client_secret.clone().unwrap_or_default(),
        ),
    };

    if require_id && client_id.is_empty() {
        return Err(AuthError::invalid_request(
            "Client credentials missing or malformed in both HTTP Authorization header and HTTP POST body",
        ));
    }

    Ok((client_id, client_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_auth_valid() {
        // "client_id:client_secret" base64 encoded
        let header = "Basic Y2xpZW50X2lkOmNsaWVudF9zZWNyZXQ=";
        let (id, secret) = parse_basic_auth(header).unwrap().unwrap();
        assert_eq!(id, "client_id");
        assert_eq!(secret, "client_secret");
    }

    #[test]
    fn test_parse_basic_auth_with_colon_in_password() {
        // "client:pass:word" base64 encoded
        let header = "Basic Y2xpZW50OnBhc3M6d29yZA==";
        let (id, secret) = parse_basic_auth(header).unwrap().unwrap();
        assert_eq!(id, "client");
        assert_eq!(secret, "pass:word");
    }

    #[test]
    fn test_parse_basic_auth_percent_decodes_credentials() {
        // "client%3Aid:s%26cret" base64 encoded; RFC 6749 2.3.1 encoding
        let header = "Basic Y2xpZW50JTNBaWQ6cyUyNmNyZXQ=";
        let (id, secret) = parse_basic_auth(header).unwrap().unwrap();
        assert_eq!(id, "client:id");
        assert_eq!(secret, "s&cret");
    }

    #[test]
    fn test_parse_basic_auth_other_scheme_is_none() {
        assert!(parse_basic_auth("Bearer some-token").unwrap().is_none());
    }

    #[test]
    fn test_parse_basic_auth_invalid_base64() {
        let err = parse_basic_auth("Basic not-valid-base64!!!").unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
        assert!(err.debug().is_some());
    }

    #[test]
    fn test_parse_basic_auth_no_colon() {
        // "clientonly" base64 encoded
        let err = parse_basic_auth("Basic Y2xpZW50b25seQ==").unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
    }

    #[test]
    fn test_extract_prefers_header_over_body() {
        let request = TokenEndpointRequest {
            authorization: Some("Basic Y2xpZW50X2lkOmNsaWVudF9zZWNyZXQ=".to_string()),
            form: TokenRequestForm {
                client_id: Some("body-client".to_string()),
                client_secret: Some("body-secret".to_string()),
                ..Default::default()
            },
            peer_certificates: vec![],
        };

        let (id, secret) = extract_client_credentials(&request, true).unwrap();
        assert_eq!(id, "client_id");
        assert_eq!(secret, "client_secret");
    }

    #[test]
    fn test_extract_falls_back_to_body() {
        let request = TokenEndpointRequest {
            form: TokenRequestForm {
                client_id: Some("body-client".to_string()),
                client_secret: Some("body-secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let (id, secret) = extract_client_credentials(&request, true).unwrap();
        assert_eq!(id, "body-client");
        assert_eq!(secret, "body-secret");
    }

    #[test]
    fn test_extract_requires_client_id() {
        let request = TokenEndpointRequest::default();
        let err = extract_client_credentials(&request, true).unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
        assert!(err.hint().contains("missing or malformed"));
    }

    #[test]
    fn test_extract_without_require_id_allows_empty() {
        let request = TokenEndpointRequest::default();
        let (id, secret) = extract_client_credentials(&request, false).unwrap();
        assert!(id.is_empty());
        assert!(secret.is_empty());
    }

    #[test]
    fn test_has_peer_certificate() {
        let mut request = TokenEndpointRequest::default();
        assert!(!request.has_peer_certificate());

        request.peer_certificates.push(vec![0x30, 0x82]);
        assert!(request.has_peer_certificate());
    }
}
