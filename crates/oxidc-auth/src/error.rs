//! Authentication error types.
//!
//! Every failure carries two layers: a human-readable hint suitable for the
//! RFC 6749 `error_description` field, and an optional debug payload with the
//! underlying cause for operator logs. The debug payload must never be
//! returned to the client.

/// Errors that can occur while authenticating a client at the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request is missing a required parameter or is otherwise malformed.
    #[error("Invalid request: {hint}")]
    InvalidRequest {
        /// Description suitable for `error_description`.
        hint: String,
        /// Underlying cause for operator logs.
        debug: Option<String>,
    },

    /// Client authentication failed.
    #[error("Invalid client: {hint}")]
    InvalidClient {
        /// Description suitable for `error_description`.
        hint: String,
        /// Underlying cause for operator logs.
        debug: Option<String>,
    },

    /// The client assertion's `jti` has already been presented.
    #[error("Assertion replayed: {hint}")]
    JtiKnown {
        /// Description suitable for `error_description`.
        hint: String,
    },

    /// The authorization server itself is misconfigured.
    #[error("Misconfiguration: {hint}")]
    Misconfiguration {
        /// Description of the configuration problem.
        hint: String,
    },

    /// A storage backend or transport failed, or the request was cancelled
    /// in flight. Propagated from collaborators unchanged.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage or transport failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(hint: impl Into<String>) -> Self {
        Self::InvalidRequest {
            hint: hint.into(),
            debug: None,
        }
    }

    /// Creates a new `InvalidRequest` error with a debug payload.
    #[must_use]
    pub fn invalid_request_debug(hint: impl Into<String>, debug: impl Into<String>) -> Self {
        Self::InvalidRequest {
            hint: hint.into(),
            debug: Some(debug.into()),
        }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(hint: impl Into<String>) -> Self {
        Self::InvalidClient {
            hint: hint.into(),
            debug: None,
        }
    }

    /// Creates a new `InvalidClient` error with a debug payload.
    #[must_use]
    pub fn invalid_client_debug(hint: impl Into<String>, debug: impl Into<String>) -> Self {
        Self::InvalidClient {
            hint: hint.into(),
            debug: Some(debug.into()),
        }
    }

    /// Creates a new `JtiKnown` error.
    #[must_use]
    pub fn jti_known() -> Self {
        Self::JtiKnown {
            hint: "The jti was already used".to_string(),
        }
    }

    /// Creates a new `Misconfiguration` error.
    #[must_use]
    pub fn misconfiguration(hint: impl Into<String>) -> Self {
        Self::Misconfiguration { hint: hint.into() }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns the human-readable hint for this error.
    #[must_use]
    pub fn hint(&self) -> &str {
        match self {
            Self::InvalidRequest { hint, .. }
            | Self::InvalidClient { hint, .. }
            | Self::JtiKnown { hint }
            | Self::Misconfiguration { hint } => hint,
            Self::Storage { message } => message,
        }
    }

    /// Returns the debug payload, if any.
    #[must_use]
    pub fn debug(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest { debug, .. } | Self::InvalidClient { debug, .. } => {
                debug.as_deref()
            }
            _ => None,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidClient { .. } => "invalid_client",
            Self::JtiKnown { .. } => "jti_known",
            Self::Misconfiguration { .. } => "misconfiguration",
            Self::Storage { .. } => "server_error",
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::InvalidClient { .. } | Self::JtiKnown { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Misconfiguration { .. } | Self::Storage { .. })
    }
}
