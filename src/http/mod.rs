//! HTTP client module
//!
//! Provides the HTTP transport with retry, rate limiting, and backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: exponential backoff for 5xx, 429 and connection errors
//! - **Rate Limiting**: optional governor pacing plus `X-Rate-Limit-*` header throttling
//! - **Typed Errors**: non-success statuses mapped to `ApiErrorKind`
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{build_request_url, ApiClient, HttpClient, HttpClientConfig};
pub use rate_limit::{RateLimitStatus, RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
