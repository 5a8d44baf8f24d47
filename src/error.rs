//! Error types for the Snapchat Ads tap
//!
//! This module defines the error hierarchy for the entire tap.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use serde_json::Value;
use thiserror::Error;

/// Classification of a non-success HTTP status returned by the Ads API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Gone,
    Teapot,
    RateLimited,
    InternalService,
    ServiceUnavailable,
    /// Any other 5xx status
    Server,
    /// Any other non-success status
    Other,
}

impl ApiErrorKind {
    /// Classify a status code
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            406 => Self::NotAcceptable,
            410 => Self::Gone,
            418 => Self::Teapot,
            429 => Self::RateLimited,
            500 => Self::InternalService,
            503 => Self::ServiceUnavailable,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Message used when the response body carries no `debug_message`
    pub fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The request is missing or has a bad parameter.",
            Self::Unauthorized => "Unauthorized access for the URL.",
            Self::Forbidden => "User does not have permission to access the resource.",
            Self::NotFound => "The resource you have specified cannot be found.",
            Self::MethodNotAllowed => "The provided HTTP method is not supported by the URL.",
            Self::NotAcceptable => "You requested a format that isn’t json.",
            Self::Gone => "Access to the Snapchat is no longer available.",
            Self::Teapot => "The server refuses to brew coffee because it is, permanently, a teapot.",
            Self::RateLimited => "You are sending too many requests.",
            Self::InternalService => "An error has occurred at Snapchat's end.",
            Self::ServiceUnavailable => "API service is currently unavailable.",
            Self::Server => "The Snapchat server returned an error.",
            Self::Other => "Unknown Error",
        }
    }

    /// Whether requests failing with this kind are worth retrying
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::InternalService | Self::ServiceUnavailable | Self::Server
        )
    }
}

/// The main error type for the tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Api {
        status: u16,
        kind: ApiErrorKind,
        message: String,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Integrity Errors
    // ============================================================================
    #[error("Stream: {stream}, request_status: {status}, response: {payload}")]
    RequestFailed {
        stream: String,
        status: String,
        payload: Value,
    },

    #[error("Stream: {stream}, sub_request_status is not SUCCESS: {payload}")]
    SubRequestFailed { stream: String, payload: Value },

    #[error("Stream: {stream}, missing key field '{field}' in record: {record}")]
    MissingKeyField {
        stream: String,
        field: String,
        record: Value,
    },

    #[error("Stream: {stream}, stats record missing '{field}': {record}")]
    MissingStatsKey {
        stream: String,
        field: String,
        record: Value,
    },

    #[error("Invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("Invalid timezone '{value}'")]
    InvalidTimezone { value: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Catalog Errors
    // ============================================================================
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an API error from a status code and an optional server message
    pub fn api(status: u16, debug_message: Option<String>) -> Self {
        let kind = ApiErrorKind::from_status(status);
        Self::Api {
            status,
            kind,
            message: debug_message.unwrap_or_else(|| kind.default_message().to_string()),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an invalid timestamp error
    pub fn timestamp(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Kind of the API error, if this is one
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            Error::Timeout { .. } => true,
            Error::Api { kind, .. } => kind.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for the tap
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
