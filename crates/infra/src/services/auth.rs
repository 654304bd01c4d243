//! Partner API authentication
//!
//! Exchanges client credentials for a bearer token at `POST token`. Tokens
//! are cached per credential pair so every service shares one token.

use std::time::Duration;

use airalo_common::Signature;
use airalo_domain::constants::{
    SIGNATURE_HEADER_NAME, TOKEN_CACHE_TTL_SECS, TOKEN_RETRY_DELAY_MS, TOKEN_RETRY_LIMIT, TOKEN_SLUG,
};
use airalo_domain::{AiraloError, Result, SdkConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::{ResponseCache, ResponseCacheConfig};
use crate::http::{HttpExecutor, RequestSpec};

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid access token
    async fn access_token(&self) -> Result<String>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    data: TokenData,
}

#[derive(Deserialize)]
struct TokenData {
    access_token: String,
}

/// Client-credentials token service.
#[derive(Debug, Clone)]
pub struct OAuthService {
    executor: HttpExecutor,
    token_url: String,
    client_id: String,
    client_secret: String,
    signature: Signature,
    cache: ResponseCache<String>,
    cache_key: String,
    retry_delay: Duration,
}

impl OAuthService {
    pub fn new(config: &SdkConfig, executor: HttpExecutor) -> Self {
        let cache = ResponseCache::new(
            "access_token",
            ResponseCacheConfig::with_ttl(Duration::from_secs(TOKEN_CACHE_TTL_SECS)),
        );

        Self {
            executor,
            token_url: format!("{}{TOKEN_SLUG}", config.base_url()),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            signature: Signature::new(config.client_secret.clone()),
            cache,
            cache_key: ResponseCache::<String>::key([
                "airalo_access_token",
                config.credentials_query().as_str(),
            ]),
            retry_delay: Duration::from_millis(TOKEN_RETRY_DELAY_MS),
        }
    }

    /// Delay between token attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    /// Request a new token, retrying once after a short pause.
    ///
    /// # Errors
    /// Returns `AiraloError::Auth` when every attempt fails.
    #[instrument(skip(self))]
    pub async fn fetch_token(&self) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.request_token().await {
                Ok(token) => {
                    info!(attempt, "access token acquired");
                    return Ok(token);
                }
                Err(err) if attempt < TOKEN_RETRY_LIMIT => {
                    warn!(attempt, error = %err, "access token request failed; retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(AiraloError::Auth(format!(
                        "Failed to get access token from API: {err}"
                    )));
                }
            }
        }
    }

    async fn request_token(&self) -> Result<String> {
        let payload = TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "client_credentials",
        };

        let mut spec = RequestSpec::post(self.token_url.as_str()).form([
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ]);
        if let Some(signature) = self.signature.sign(&payload) {
            spec = spec.header(format!("{SIGNATURE_HEADER_NAME}: {signature}"));
        }

        debug!(url = %self.token_url, "requesting access token");
        let raw = self.executor.send(&spec).await?;

        if raw.is_unavailable() {
            return Err(AiraloError::Network("token endpoint produced no response".into()));
        }

        if raw.status() != 200 {
            return Err(AiraloError::Api { status: raw.status(), body: raw.text() });
        }

        let envelope: TokenEnvelope = raw.json()?;
        if envelope.data.access_token.is_empty() {
            return Err(AiraloError::Auth("token response carried an empty access_token".into()));
        }

        Ok(envelope.data.access_token)
    }
}

#[async_trait]
impl AccessTokenProvider for OAuthService {
    async fn access_token(&self) -> Result<String> {
        let token = self
            .cache
            .get_or_fetch(self.cache_key.clone(), || async { self.fetch_token().await.map(Some) })
            .await?;

        token.ok_or_else(|| AiraloError::Internal("token fetch produced no token".into()))
    }
}
