//! OAuth provider abstraction.
//!
//! A provider turns an authorization code into an [`ExternalProfile`]. The
//! bridge only depends on the [`OAuthProvider`] trait, so tests substitute a
//! fixed profile and deployments can add providers besides GitHub.

use async_trait::async_trait;
use url::Url;

use crate::storage::NewIdentity;

use super::error::IdpError;

/// What the provider callback hands to the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    /// Authorization code from the callback.
    pub code: String,
}

impl AuthorizationContext {
    /// Creates a context for `code`.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Identity data returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalProfile {
    /// Provider-assigned identifier.
    pub external_id: String,
    /// Login name.
    pub username: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

impl ExternalProfile {
    /// Sets first and last name from a display name.
    ///
    /// The name is split on the first space; a single word becomes the
    /// first name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<&str>) -> Self {
        let (first, last) = split_display_name(name);
        self.first_name = first;
        self.last_name = last;
        self
    }

    /// Converts the profile into a new customer identity.
    #[must_use]
    pub fn into_new_identity(self) -> NewIdentity {
        NewIdentity {
            external_id: self.external_id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: Default::default(),
        }
    }
}

fn split_display_name(name: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return (None, None);
    };
    match name.split_once(' ') {
        Some((first, last)) => {
            let last = last.trim();
            (
                Some(first.to_string()),
                (!last.is_empty()).then(|| last.to_string()),
            )
        }
        None => (Some(name.to_string()), None),
    }
}

/// An external OAuth identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Short provider identifier, e.g. `"github"`.
    fn id(&self) -> &str;

    /// Builds the URL the browser is redirected to for login.
    ///
    /// # Errors
    ///
    /// Returns `IdpError::UrlError` if the configured endpoint is invalid.
    fn authorization_url(&self, state: &str) -> Result<Url, IdpError>;

    /// Exchanges an authorization code for the user's profile.
    ///
    /// # Errors
    ///
    /// Returns an [`IdpError`] if the code is rejected, the provider is
    /// unreachable or the profile cannot be mapped.
    async fn exchange(&self, context: &AuthorizationContext) -> Result<ExternalProfile, IdpError>;
}
