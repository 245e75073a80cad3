//! Remote JWKS fetching and caching.
//!
//! # Caching Strategy
//!
//! - Fetched sets are cached in memory with a configurable TTL (default: 1 hour)
//! - `force_refresh` bypasses the cache and always fetches
//! - Only HTTPS URIs are fetched
//! - HTTP timeouts and a response size cap bound each fetch

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwks::JwksResolver;

/// Configuration for the JWKS fetcher cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwksCacheConfig {
    /// Time-to-live for cached JWK Sets (default: 1 hour).
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// HTTP request timeout (default: 10 seconds).
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum response size in bytes (default: 1 MB).
    pub max_response_size: usize,
}

impl Default for JwksCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024,
        }
    }
}

impl JwksCacheConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum response size.
    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }
}

/// Cached JWKS entry with metadata.
struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS resolver backed by HTTP with an in-memory TTL cache.
///
/// Intended to be shared process-wide across requests.
///
/// # Example
///
/// ```ignore
/// use oxidc_auth::jwks::{HttpJwksFetcher, JwksResolver};
///
/// let fetcher = HttpJwksFetcher::with_defaults();
/// let jwks = fetcher
///     .resolve("https://client.example.com/.well-known/jwks.json", false)
///     .await?;
/// ```
pub struct HttpJwksFetcher {
    cache: RwLock<HashMap<String, CachedJwks>>,
    config: JwksCacheConfig,
}

impl HttpJwksFetcher {
    /// Creates a new fetcher with the specified configuration.
    #[must_use]
    pub fn new(config: JwksCacheConfig) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Creates a new fetcher with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(JwksCacheConfig::default())
    }

    /// Fetches a JWK Set from a URI.
    async fn fetch_jwks(&self, uri: &str) -> AuthResult<JwkSet> {
        if !uri.starts_with("https://") {
            return Err(AuthError::invalid_request("JWKS URI must use HTTPS"));
        }

        let client = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|e| AuthError::storage(format!("Failed to create HTTP client: {}", e)))?;

        let response = client
            .get(uri)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch JWKS from {}: {}", uri, e);
                AuthError::storage(format!("Failed to fetch JWKS: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AuthError::storage(format!(
                "JWKS fetch failed with status: {}",
                response.status()
            )));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_response_size
        {
            return Err(AuthError::storage("JWKS response exceeds maximum size"));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::storage(format!("Invalid JWKS JSON: {}", e)))?;

        Ok(jwks)
    }

    /// Invalidates a cached entry.
    pub async fn invalidate(&self, jwks_uri: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(jwks_uri);
    }

    /// Clears all cached entries.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }
}

#[async_trait]
impl JwksResolver for HttpJwksFetcher {
    async fn resolve(&self, jwks_uri: &str, force_refresh: bool) -> AuthResult<JwkSet> {
        if !force_refresh {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(jwks_uri)
                && cached.fetched_at.elapsed() < self.config.ttl
            {
                return Ok(cached.jwks.clone());
            }
        }

        let jwks = self.fetch_jwks(jwks_uri).await?;

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                jwks_uri.to_string(),
                CachedJwks {
                    jwks: jwks.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }

        Ok(jwks)
    }
}
