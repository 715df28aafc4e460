//! Error types for external identity provider operations.

/// Errors that can occur while talking to an OAuth provider.
#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    /// Token exchange with the provider failed.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The provider returned an OAuth error.
    #[error("OAuth error from provider: {error} - {description}")]
    OAuthError {
        /// The OAuth error code.
        error: String,
        /// Optional error description.
        description: String,
    },

    /// The profile lookup failed.
    #[error("Profile request failed: {0}")]
    ProfileFetchFailed(String),

    /// The profile could not be mapped to an identity.
    #[error("User mapping failed: {0}")]
    UserMappingFailed(String),

    /// A network error occurred.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Failed to parse a URL.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Missing required field in configuration or a provider response.
    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl IdpError {
    /// Creates an `OAuthError` from a provider response.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuthError {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Returns `true` if the failure is on the provider side or the network,
    /// as opposed to a rejected authorization code.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::ProfileFetchFailed(_))
    }
}
