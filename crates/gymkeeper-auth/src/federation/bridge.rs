//! Bridge from an external OAuth identity to a gymkeeper identity.
//!
//! A successful provider exchange yields an [`ExternalProfile`]. The bridge
//! finds the stored identity by external id (or registers a new customer),
//! issues a login token pair and records it as the identity's live tokens.
//! Any earlier tokens of that identity stop verifying.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{Identity, IdentityStorage, TokenUpdate};
use crate::token::{TokenPair, TokenService};

use super::provider::{AuthorizationContext, ExternalProfile, OAuthProvider};

/// Whether a login found an existing identity or created one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningAction {
    /// The external id was already known.
    ExistingIdentity,
    /// A new customer identity was registered.
    Created,
}

/// Result of a completed OAuth login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// What happened to the identity.
    pub action: ProvisioningAction,
    /// The identity after the tokens were written.
    pub identity: Identity,
    /// Tokens handed to the client.
    pub tokens: TokenPair,
}

impl LoginOutcome {
    /// Returns `true` if the login registered a new identity.
    #[must_use]
    pub fn is_registration(&self) -> bool {
        self.action == ProvisioningAction::Created
    }
}

/// Find-or-create plus token issuance for OAuth logins.
#[derive(Clone)]
pub struct OAuthBridge {
    identities: Arc<dyn IdentityStorage>,
    tokens: Arc<TokenService>,
}

impl OAuthBridge {
    /// Creates a bridge over an identity store and token service.
    pub fn new(identities: Arc<dyn IdentityStorage>, tokens: Arc<TokenService>) -> Self {
        Self { identities, tokens }
    }

    /// Runs the provider exchange for `context` and logs the user in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IdentityProvider` if the provider exchange fails,
    /// plus anything [`OAuthBridge::login`] returns.
    pub async fn authenticate(
        &self,
        provider: &dyn OAuthProvider,
        context: &AuthorizationContext,
    ) -> AuthResult<LoginOutcome> {
        let profile = provider.exchange(context).await.map_err(|e| {
            tracing::warn!(
                provider = provider.id(),
                transient = e.is_transient(),
                error = %e,
                "OAuth exchange failed"
            );
            AuthError::identity_provider(provider.id(), e.to_string())
        })?;

        self.login(profile).await
    }

    /// Logs in the owner of `profile`, registering them on first sight.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidRequest` if the profile has no external id
    /// - `AuthError::Storage` if the store fails
    /// - `AuthError::Internal` if token signing fails
    pub async fn login(&self, profile: ExternalProfile) -> AuthResult<LoginOutcome> {
        if profile.external_id.trim().is_empty() {
            return Err(AuthError::invalid_request(
                "provider profile has no external id",
            ));
        }

        let (identity, action) = self.find_or_create(profile).await?;
        let pair = self.tokens.issue_login_pair(identity.id)?;

        let identity = self
            .identities
            .update_tokens(
                identity.id,
                TokenUpdate::pair(&pair.access_token, &pair.refresh_token),
            )
            .await?;

        tracing::info!(
            identity_id = identity.id,
            role = %identity.role,
            registered = action == ProvisioningAction::Created,
            "OAuth login completed"
        );

        Ok(LoginOutcome {
            action,
            identity,
            tokens: pair,
        })
    }

    async fn find_or_create(
        &self,
        profile: ExternalProfile,
    ) -> AuthResult<(Identity, ProvisioningAction)> {
        if let Some(existing) = self
            .identities
            .find_by_external_id(&profile.external_id)
            .await?
        {
            return Ok((existing, ProvisioningAction::ExistingIdentity));
        }

        let external_id = profile.external_id.clone();
        match self.identities.create(profile.into_new_identity()).await {
            Ok(created) => {
                tracing::info!(identity_id = created.id, "Registered new identity");
                Ok((created, ProvisioningAction::Created))
            }
            // A concurrent callback for the same user won the insert.
            Err(AuthError::Conflict { .. }) => {
                let existing = self
                    .identities
                    .find_by_external_id(&external_id)
                    .await?
                    .ok_or_else(|| {
                        AuthError::storage("identity vanished after uniqueness conflict")
                    })?;
                Ok((existing, ProvisioningAction::ExistingIdentity))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::federation::IdpError;
    use crate::storage::{InMemoryIdentityStore, NewIdentity, Role};
    use crate::token::TokenKind;
    use async_trait::async_trait;
    use url::Url;

    struct FixedProvider(Result<ExternalProfile, ()>);

    #[async_trait]
    impl OAuthProvider for FixedProvider {
        fn id(&self) -> &str {
            "fixed"
        }

        fn authorization_url(&self, state: &str) -> Result<Url, IdpError> {
            Ok(Url::parse(&format!("https://idp.test/authorize?state={state}"))?)
        }

        async fn exchange(
            &self,
            _context: &AuthorizationContext,
        ) -> Result<ExternalProfile, IdpError> {
            self.0
                .clone()
                .map_err(|()| IdpError::oauth_error("bad_verification_code", "stale code"))
        }
    }

    fn setup() -> (OAuthBridge, Arc<InMemoryIdentityStore>, Arc<TokenService>) {
        let store = Arc::new(InMemoryIdentityStore::new());
        let tokens = Arc::new(TokenService::new("test-secret", TokenConfig::default()));
        (OAuthBridge::new(store.clone(), tokens.clone()), store, tokens)
    }

    fn profile(external_id: &str) -> ExternalProfile {
        ExternalProfile {
            external_id: external_id.to_string(),
            username: Some("octocat".to_string()),
            email: Some("octocat@github.com".to_string()),
            ..ExternalProfile::default()
        }
    }

    #[tokio::test]
    async fn test_new_external_id_registers_customer() {
        let (bridge, store, tokens) = setup();

        let outcome = bridge.login(profile("583231")).await.unwrap();

        assert!(outcome.is_registration());
        assert_eq!(outcome.identity.role, Role::Customer);
        assert!(!outcome.tokens.access_token.is_empty());
        assert!(!outcome.tokens.refresh_token.is_empty());
        assert_eq!(
            outcome.identity.live_access_token(),
            Some(outcome.tokens.access_token.as_str())
        );
        assert_eq!(store.len().await, 1);

        let verified = tokens
            .verify(&outcome.tokens.refresh_token, TokenKind::Refresh)
            .unwrap();
        assert_eq!(verified.subject, outcome.identity.id);
        assert_eq!(verified.claims.exp - verified.claims.iat, 5 * 3600);
    }

    #[tokio::test]
    async fn test_known_external_id_keeps_role_and_rotates_tokens() {
        let (bridge, store, _) = setup();
        let coach = store
            .create(NewIdentity::new("583231").role(Role::Coach))
            .await
            .unwrap();

        let first = bridge.login(profile("583231")).await.unwrap();
        let second = bridge.login(profile("583231")).await.unwrap();

        assert_eq!(first.action, ProvisioningAction::ExistingIdentity);
        assert_eq!(second.identity.id, coach.id);
        assert_eq!(second.identity.role, Role::Coach);
        assert_ne!(first.tokens.refresh_token, second.tokens.refresh_token);
        assert_eq!(
            second.identity.live_refresh_token(),
            Some(second.tokens.refresh_token.as_str())
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_blank_external_id_rejected() {
        let (bridge, store, _) = setup();
        let err = bridge.login(profile("  ")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_first_logins_share_identity() {
        let (bridge, store, _) = setup();

        let (a, b) = tokio::join!(
            bridge.login(profile("583231")),
            bridge.login(profile("583231"))
        );

        assert_eq!(a.unwrap().identity.id, b.unwrap().identity.id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_identity_provider_error() {
        let (bridge, store, _) = setup();
        let provider = FixedProvider(Err(()));

        let err = bridge
            .authenticate(&provider, &AuthorizationContext::new("stale"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::IdentityProvider { ref provider, .. } if provider == "fixed"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_authenticate_through_provider() {
        let (bridge, _, _) = setup();
        let provider = FixedProvider(Ok(profile("42")));

        let outcome = bridge
            .authenticate(&provider, &AuthorizationContext::new("code"))
            .await
            .unwrap();
        assert_eq!(outcome.identity.external_id, "42");
    }
}
