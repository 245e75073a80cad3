//! Client authentication configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! token_endpoint = "https://as.example.com/oauth/token"
//!
//! [auth.jwks]
//! ttl = "1h"
//! request_timeout = "10s"
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::jwks::JwksCacheConfig;

/// Configuration for the token-endpoint client authentication core.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Public URL of this server's token endpoint.
    ///
    /// Client assertions must carry this URL in their `aud` claim. Leaving it
    /// unset makes every `private_key_jwt` authentication fail with a
    /// misconfiguration error.
    pub token_endpoint: String,

    /// JWKS fetching and caching configuration.
    pub jwks: JwksCacheConfig,
}

impl AuthConfig {
    /// Creates a configuration with the given token endpoint URL.
    #[must_use]
    pub fn new(token_endpoint: impl Into<String>) -> Self {
        Self {
            token_endpoint: token_endpoint.into(),
            jwks: JwksCacheConfig::default(),
        }
    }

    /// Sets the JWKS cache configuration.
    #[must_use]
    pub fn with_jwks(mut self, jwks: JwksCacheConfig) -> Self {
        self.jwks = jwks;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint is unset or not an absolute URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_endpoint.is_empty() {
            return Err(ConfigError::MissingTokenEndpoint);
        }

        Url::parse(&self.token_endpoint)
            .map_err(|e| ConfigError::InvalidTokenEndpoint {
                message: e.to_string(),
            })?;

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The token endpoint URL is not set.
    #[error("token_endpoint is not configured")]
    MissingTokenEndpoint,

    /// The token endpoint URL could not be parsed.
    #[error("token_endpoint is not a valid URL: {message}")]
    InvalidTokenEndpoint {
        /// Description of the parse failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_absolute_url() {
        let config = AuthConfig::new("https://as.example.com/oauth/token");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let config = AuthConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTokenEndpoint)
        ));
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let config = AuthConfig::new("/oauth/token");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTokenEndpoint { .. })
        ));
    }

    #[test]
    fn test_deserialize_from_toml_shape() {
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "token_endpoint": "https://as.example.com/oauth/token",
        }))
        .unwrap();

        assert_eq!(config.token_endpoint, "https://as.example.com/oauth/token");
    }
}
