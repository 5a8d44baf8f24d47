//! Authenticator implementation
//!
//! Handles applying authentication to requests and managing token refresh.

use super::types::{AuthConfig, CachedToken, DEFAULT_TOKEN_LIFETIME_SECS};
use crate::error::{Error, Result};
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached access token for the refresh flow
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
    /// User agent sent to the token endpoint
    user_agent: Option<String>,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
            user_agent: None,
        }
    }

    /// Send a user agent with token requests
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.get_or_refresh_token().await?;
        Ok(req.bearer_auth(token))
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_oauth2_refresh().await?;
        let token_str = new_token.token.clone();
        if let Some(expires_at) = new_token.expires_at {
            info!("Authorized, token expires = {expires_at}");
        }
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Fetch OAuth2 token using refresh token flow
    ///
    /// 5xx responses surface as retryable API errors so the caller's retry
    /// loop can back off and try again.
    async fn fetch_oauth2_refresh(&self) -> Result<CachedToken> {
        let AuthConfig {
            token_url,
            client_id,
            client_secret,
            refresh_token,
        } = &self.config;
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ];

        let mut req = self.http_client.post(token_url).form(&form);
        if let Some(ref agent) = self.user_agent {
            req = req.header(USER_AGENT, agent);
        }

        let response = req.send().await.map_err(Error::Http)?;
        let status = response.status();

        if status.is_server_error() {
            return Err(Error::api(status.as_u16(), None));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("debug_message").and_then(Value::as_str).map(String::from))
                .unwrap_or(body);
            return Err(Error::TokenRefresh {
                message: format!("{}: {detail}", status.as_u16()),
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        token_response.into_cached_token()
    }

    /// Clear the cached token (useful for testing or forced refresh)
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    /// Some deployments send this as a string
    #[serde(default)]
    expires_in: Option<Value>,
}

impl TokenResponse {
    fn into_cached_token(self) -> Result<CachedToken> {
        let token = self.access_token.ok_or_else(|| Error::TokenRefresh {
            message: "token response has no access_token".to_string(),
        })?;

        let lifetime = match self.expires_in {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(CachedToken::expires_in(token, lifetime))
    }
}
