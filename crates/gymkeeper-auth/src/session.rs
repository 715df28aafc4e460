//! Refresh flow.
//!
//! Exchanges a live refresh token for a new access token and a new
//! rotated-tier refresh token. Rotation is total: both stored tokens are
//! replaced, so the presented refresh token and every earlier access token
//! stop working.
//!
//! The store write is conditioned on the presented refresh token still being
//! the stored one. Of two concurrent refreshes with the same token exactly
//! one succeeds; the other gets `SupersededCredential`.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{IdentityStorage, TokenUpdate};
use crate::token::{TokenKind, TokenPair, TokenService};

/// Rotates token pairs from a refresh token.
#[derive(Clone)]
pub struct RefreshFlow {
    identities: Arc<dyn IdentityStorage>,
    tokens: Arc<TokenService>,
}

impl RefreshFlow {
    /// Creates a refresh flow over an identity store and token service.
    pub fn new(identities: Arc<dyn IdentityStorage>, tokens: Arc<TokenService>) -> Self {
        Self { identities, tokens }
    }

    /// Rotates the pair belonging to `refresh_token`.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the token is empty
    /// - `SupersededCredential` if no identity holds the token, or a
    ///   concurrent refresh rotated it first
    /// - `ExpiredCredential` or `MalformedCredential` if verification fails
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let presented = refresh_token.trim();
        if presented.is_empty() {
            return Err(AuthError::invalid_request("refreshToken is required"));
        }

        let identity = self
            .identities
            .find_by_refresh_token(presented)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Refresh token is not stored on any identity");
                AuthError::superseded_credential("refresh token is not recognized")
            })?;

        let verified = self
            .tokens
            .verify(presented, TokenKind::Refresh)
            .inspect_err(|e| {
                tracing::debug!(identity_id = identity.id, error = %e, "Refresh token rejected");
            })?;

        if verified.subject != identity.id {
            tracing::debug!(
                identity_id = identity.id,
                subject = verified.subject,
                "Refresh token subject does not match its holder"
            );
            return Err(AuthError::malformed_credential(
                "refresh token subject does not match",
            ));
        }

        let pair = self.tokens.issue_rotated_pair(identity.id)?;
        self.identities
            .update_tokens(
                identity.id,
                TokenUpdate::pair(&pair.access_token, &pair.refresh_token)
                    .if_refresh_token_is(presented),
            )
            .await?;

        tracing::info!(identity_id = identity.id, role = %identity.role, "Token pair rotated");
        Ok(pair)
    }
}
