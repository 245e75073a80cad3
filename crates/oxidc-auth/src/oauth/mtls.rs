//! TLS client certificate authentication (`tls_client_auth`).
//!
//! The first peer certificate's subject is rendered to its RFC 4514 string
//! form and the registered expected value is matched as a substring of that
//! rendering. Only the `DN` subject field (the entire Distinguished Name) is
//! supported; SAN-based matching is not implemented.

use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::client_auth::lookup_client;
use crate::oauth::request::TokenEndpointRequest;
use crate::storage::ClientStorage;
use crate::types::{Client, TokenEndpointAuthMethod};

/// Authenticates a client by its TLS peer certificate.
///
/// Preconditions: the request carries at least one peer certificate and a
/// non-empty `client_id` form parameter.
///
/// # Errors
///
/// Returns an error if:
/// - The `client_id` form parameter is missing
/// - The client is unknown or not registered for `tls_client_auth`
/// - The registered certificate subject field is not `DN`
/// - The certificate cannot be parsed or its subject does not match
pub async fn authenticate_tls_client(
    request: &TokenEndpointRequest,
    clients: &dyn ClientStorage,
) -> AuthResult<Client> {
    let client_id = request.form.client_id.as_deref().unwrap_or("");
    if client_id.is_empty() {
        return Err(AuthError::invalid_request(
            "The 'client_id' request parameter must be set when using TLS client authentication",
        ));
    }

    let der = request.peer_certificates.first().ok_or_else(|| {
        AuthError::invalid_request("No TLS peer certificate was presented")
    })?;

    let client = lookup_client(clients, client_id).await?;

    let Some(oidc) = client.oidc.as_ref() else {
        return Err(AuthError::invalid_request(
            "The server configuration does not support OpenID Connect specific authentication methods",
        ));
    };

    if oidc.token_endpoint_auth_method != TokenEndpointAuthMethod::TlsClientAuth {
        return Err(AuthError::invalid_request(format!(
            "This client supports client authentication method '{}', but method 'tls_client_auth' was requested",
            oidc.token_endpoint_auth_method
        )));
    }

    if oidc.certificate_subject_field != "DN" {
        return Err(AuthError::invalid_client(format!(
            "Certificate subject field '{}' is not supported",
            oidc.certificate_subject_field
        )));
    }

    if oidc.certificate_subject_value.is_empty() {
        return Err(AuthError::invalid_client(
            "The client has no expected certificate subject value registered",
        ));
    }

    let (_, certificate) = X509Certificate::from_der(der).map_err(|e| {
        AuthError::invalid_request_debug(
            "Unable to parse the TLS peer certificate",
            e.to_string(),
        )
    })?;

    let subject = certificate.subject().to_string();
    if !subject.contains(&oidc.certificate_subject_value) {
        tracing::debug!(
            subject = %subject,
            expected = %oidc.certificate_subject_value,
            "TLS certificate subject mismatch"
        );
        return Err(AuthError::invalid_request(
            "The TLS peer certificate's subject does not match the value registered for this client",
        ));
    }

    Ok(client)
}
