//! HTTP client with retry and rate limiting
//!
//! Provides the transport used by every stream:
//! - Automatic retries with exponential backoff for 5xx, 429 and network errors
//! - Bearer token refresh through the auth module
//! - Throttling on the API's rate-limit headers
//! - Status code classification into typed API errors

use super::rate_limit::{RateLimitStatus, RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Transport seam used by the sync engine
///
/// `endpoint` names the stream a call belongs to and is only used for logging.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// API root that relative paths are joined onto
    fn base_url(&self) -> &str;

    /// GET a URL and return the parsed JSON body
    async fn get(&self, url: &str, endpoint: &str) -> Result<Value>;

    /// POST a JSON body and return the parsed JSON response
    async fn post(&self, url: &str, endpoint: &str, body: Value) -> Result<Value>;
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Client-side pacing
    pub rate_limit: Option<RateLimiterConfig>,
    /// Pause until the quota resets once less than this percentage remains
    pub throttle_threshold_percent: f64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(300),
            max_retries: 6,
            initial_backoff: Duration::from_secs(3),
            max_backoff: Duration::from_secs(300),
            rate_limit: None,
            throttle_threshold_percent: 5.0,
            user_agent: format!("tap-snapchat-ads/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the exponential backoff bounds
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Enable client-side pacing
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Set the rate-limit header throttle threshold
    pub fn throttle_threshold(mut self, percent: f64) -> Self {
        self.config.throttle_threshold_percent = percent;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(
            Authenticator::with_client(auth_config, client.client.clone())
                .with_user_agent(client.config.user_agent.clone()),
        );
        Ok(client)
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Make a request and parse the JSON response
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let full_url = self.build_url(url);
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let outcome = self.attempt(method.clone(), &full_url, body).await;

            match outcome {
                Ok(value) => {
                    debug!("Request succeeded: {} {} ({})", method, full_url, endpoint);
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "{endpoint}: {e}, attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("{endpoint}: request to {full_url} failed: {e}");
                    return Err(e);
                }
            }
        }
    }

    /// One request/response round trip, without retries
    async fn attempt(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(ref auth) = self.authenticator {
            req = auth.apply(req).await?;
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        self.throttle(&response).await;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), debug_message(&body)));
        }

        let text = response.text().await.map_err(Error::Http)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::decode(format!("invalid JSON from {url}: {e}")))
    }

    /// Sleep until the quota resets when the remaining share is low
    async fn throttle(&self, response: &Response) {
        let status = RateLimitStatus::from_headers(response.headers());
        if let Some(wait) =
            status.throttle_delay(self.config.throttle_threshold_percent, Utc::now())
        {
            warn!(
                "Rate Limit Warning: {}; remaining calls: {}; remaining %: {:.0}%",
                status.limit,
                status.remaining,
                status.percent_remaining()
            );
            warn!("Waiting for {} seconds.", wait.as_secs());
            tokio::time::sleep(wait).await;
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Exponential backoff delay for a given attempt, capped at `max_backoff`
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.config.initial_backoff.saturating_mul(factor);

        std::cmp::min(delay, self.config.max_backoff)
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or_default()
    }

    async fn get(&self, url: &str, endpoint: &str) -> Result<Value> {
        self.request(Method::GET, url, endpoint, None).await
    }

    async fn post(&self, url: &str, endpoint: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, url, endpoint, Some(&body)).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Pull `debug_message` out of an API error body
fn debug_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("debug_message")?
        .as_str()
        .map(ToString::to_string)
}

/// Join a relative path onto the API root and append query parameters in order
pub fn build_request_url(base_url: &str, path: &str, query: &[(String, String)]) -> Result<String> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)?;
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url.into())
}
