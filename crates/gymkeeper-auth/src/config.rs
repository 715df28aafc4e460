//! Authentication and authorization configuration.
//!
//! The configuration is built once at startup and handed to the token
//! service and the OAuth bridge. Nothing in this crate reads the process
//! environment directly.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! secret = "change-me"
//!
//! [auth.tokens]
//! access_token_lifetime = "1h"
//! refresh_token_lifetime = "5h"
//! rotated_refresh_token_lifetime = "20h"
//!
//! [auth.github]
//! client_id = "..."
//! client_secret = "..."
//! redirect_url = "http://localhost:7000/api/v1/auth/github/callback"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root authentication configuration.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret used to sign and verify every token.
    pub secret: Option<String>,

    /// Token lifetimes.
    pub tokens: TokenConfig,

    /// GitHub OAuth application settings.
    pub github: OAuthConfig,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("tokens", &self.tokens)
            .field("github", &self.github)
            .finish()
    }
}

/// Token lifetime configuration.
///
/// Two refresh tiers exist: the standard tier is handed out on OAuth login,
/// the rotated tier on every refresh cycle and for the super-admin bootstrap.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime issued on login.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Refresh token lifetime issued on rotation.
    #[serde(with = "humantime_serde")]
    pub rotated_refresh_token_lifetime: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(3600),
            refresh_token_lifetime: Duration::from_secs(5 * 3600),
            rotated_refresh_token_lifetime: Duration::from_secs(20 * 3600),
        }
    }
}

/// OAuth client settings for the external identity provider.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// OAuth application client id.
    pub client_id: String,

    /// OAuth application client secret.
    pub client_secret: String,

    /// Callback URL registered with the provider.
    pub redirect_url: String,

    /// Authorization endpoint the browser is redirected to.
    pub authorize_url: String,

    /// Token endpoint used for the code exchange.
    pub token_url: String,

    /// Base URL of the provider's REST API (profile lookup).
    pub api_base_url: String,

    /// Requested scopes.
    pub scopes: Vec<String>,

    /// How long an issued `state` parameter stays redeemable.
    #[serde(with = "humantime_serde")]
    pub state_ttl: Duration,

    /// Upper bound on `state` values awaiting a callback. The oldest pending
    /// value is evicted once it is reached.
    pub max_pending_states: usize,

    /// Timeout for calls to the provider.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: "http://localhost:7000/api/v1/auth/github/callback".to_string(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            scopes: vec!["user:email".to_string()],
            state_ttl: Duration::from_secs(600),
            max_pending_states: 10_000,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("scopes", &self.scopes)
            .field("state_ttl", &self.state_ttl)
            .field("max_pending_states", &self.max_pending_states)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Returns the signing secret if one is configured and non-blank.
    #[must_use]
    pub fn signing_secret(&self) -> Option<&str> {
        self.secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no signing secret is configured and
    /// `ConfigError::InvalidValue` if lifetimes are zero or the rotated
    /// refresh tier is not longer than the standard one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret().is_none() {
            return Err(ConfigError::Missing("auth.secret".to_string()));
        }

        let tokens = &self.tokens;
        if tokens.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be > 0".to_string(),
            ));
        }
        if tokens.refresh_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "refresh_token_lifetime must be > 0".to_string(),
            ));
        }
        if tokens.rotated_refresh_token_lifetime <= tokens.refresh_token_lifetime {
            return Err(ConfigError::InvalidValue(
                "rotated_refresh_token_lifetime must be longer than refresh_token_lifetime"
                    .to_string(),
            ));
        }

        if self.github.state_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "github.state_ttl must be > 0".to_string(),
            ));
        }
        if self.github.max_pending_states == 0 {
            return Err(ConfigError::InvalidValue(
                "github.max_pending_states must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
