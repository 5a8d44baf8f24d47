//! Authentication module
//!
//! Implements the OAuth2 refresh-token grant used by the Snapchat Marketing
//! API.
//!
//! The `Authenticator` manages token caching so the access token is only
//! refreshed once it has expired.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken};
