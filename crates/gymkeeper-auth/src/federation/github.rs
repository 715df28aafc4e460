//! GitHub OAuth provider.
//!
//! Implements the web application flow: redirect to the authorize endpoint,
//! exchange the returned code at the token endpoint, then read the user
//! from `GET /user`. All three URLs come from [`OAuthConfig`] so tests can
//! point them at a mock server.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use url::Url;

use crate::config::OAuthConfig;

use super::error::IdpError;
use super::provider::{AuthorizationContext, ExternalProfile, OAuthProvider};

const USER_AGENT: &str = concat!("gymkeeper/", env!("CARGO_PKG_VERSION"));

/// Token endpoint response. GitHub reports OAuth errors with a 200 status,
/// so both shapes share one struct.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    email: Option<String>,
    name: Option<String>,
}

/// GitHub OAuth provider.
pub struct GithubProvider {
    http_client: reqwest::Client,
    user_url: Url,
    config: OAuthConfig,
}

impl GithubProvider {
    /// Provider identifier.
    pub const ID: &'static str = "github";

    /// Creates a provider from OAuth settings.
    ///
    /// # Errors
    ///
    /// Returns `IdpError::NetworkError` if the HTTP client cannot be built
    /// and `IdpError::UrlError` if `api_base_url` does not parse.
    pub fn new(config: OAuthConfig) -> Result<Self, IdpError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let user_url = api_url(&config.api_base_url, "user")?;

        Ok(Self {
            http_client,
            user_url,
            config,
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<String, IdpError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        tracing::debug!(token_url = %self.config.token_url, "Exchanging authorization code");

        let response = self
            .http_client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdpError::TokenExchangeFailed(format!("HTTP {status} - {body}")));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            IdpError::TokenExchangeFailed(format!("Failed to parse token response: {e}"))
        })?;

        if let Some(error) = token.error {
            return Err(IdpError::oauth_error(
                error,
                token.error_description.unwrap_or_default(),
            ));
        }

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| IdpError::MissingField("access_token".to_string()))
    }

    async fn fetch_user(&self, access_token: &str) -> Result<GithubUser, IdpError> {
        let response = self
            .http_client
            .get(self.user_url.clone())
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdpError::ProfileFetchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IdpError::UserMappingFailed(format!("Failed to parse user: {e}")))
    }
}

/// Resolves `endpoint` below `base`, keeping the last path segment of a base
/// such as `https://ghe.example.com/api/v3`.
fn api_url(base: &str, endpoint: &str) -> Result<Url, IdpError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(endpoint)?)
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn authorization_url(&self, state: &str) -> Result<Url, IdpError> {
        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    async fn exchange(&self, context: &AuthorizationContext) -> Result<ExternalProfile, IdpError> {
        let access_token = self.exchange_code(&context.code).await?;
        let user = self.fetch_user(&access_token).await?;

        tracing::debug!(github_id = user.id, login = %user.login, "Fetched GitHub profile");

        Ok(ExternalProfile {
            external_id: user.id.to_string(),
            username: Some(user.login),
            email: user.email,
            first_name: None,
            last_name: None,
        }
        .with_display_name(user.name.as_deref()))
    }
}
