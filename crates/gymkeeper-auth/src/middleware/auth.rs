//! Access token verification.
//!
//! [`verify_token`] is an axum middleware that authenticates the request and
//! attaches an [`IdentityContext`] to it. [`BearerAuth`] is the matching
//! extractor for handlers.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use gymkeeper_auth::middleware::{AuthState, BearerAuth, verify_token};
//!
//! async fn protected_handler(BearerAuth(ctx): BearerAuth) -> String {
//!     format!("Hello, {}!", ctx.id())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .route_layer(middleware::from_fn_with_state(auth_state.clone(), verify_token))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{AdminGymStorage, IdentityStorage, Role};
use crate::token::{StoredTokenEquality, TokenKind, TokenRevocationCheck, TokenService};

use super::types::IdentityContext;

// =============================================================================
// Auth State
// =============================================================================

/// State required for access token verification.
///
/// This struct should be included in your application state and made
/// available to the middleware and the `BearerAuth` extractor via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Token service for signature and expiry checks.
    pub tokens: Arc<TokenService>,

    /// Identity storage for resolving the token subject.
    pub identities: Arc<dyn IdentityStorage>,

    /// Admin-gym storage for loading an admin's gyms.
    pub admin_gyms: Arc<dyn AdminGymStorage>,

    /// Decides whether a valid token is still live.
    pub revocation: Arc<dyn TokenRevocationCheck>,
}

impl AuthState {
    /// Creates a new auth state using stored-token equality for revocation.
    pub fn new(
        tokens: Arc<TokenService>,
        identities: Arc<dyn IdentityStorage>,
        admin_gyms: Arc<dyn AdminGymStorage>,
    ) -> Self {
        Self {
            tokens,
            identities,
            admin_gyms,
            revocation: Arc::new(StoredTokenEquality),
        }
    }

    /// Replaces the revocation check.
    #[must_use]
    pub fn with_revocation_check(mut self, revocation: Arc<dyn TokenRevocationCheck>) -> Self {
        self.revocation = revocation;
        self
    }

    /// Authenticates a request from its headers.
    ///
    /// Performs no writes.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no bearer token is present
    /// - `ExpiredCredential` or `MalformedCredential` if the token fails
    ///   verification
    /// - `InvalidRequest` if the subject is not an identity id
    /// - `UnknownSubject` if the identity does not exist
    /// - `SupersededCredential` if a newer token has been issued
    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthResult<IdentityContext> {
        let token = bearer_token(headers)
            .ok_or_else(|| AuthError::missing_credential("Missing bearer token"))?;

        let verified = self.tokens.verify(token, TokenKind::Access).inspect_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
        })?;

        let identity = self
            .identities
            .find_by_id(verified.subject)
            .await?
            .ok_or_else(|| {
                tracing::debug!(identity_id = verified.subject, "Token subject not found");
                AuthError::unknown_subject(format!("identity {} not found", verified.subject))
            })?;

        self.revocation
            .ensure_live(&identity, TokenKind::Access, token)?;

        let admin_gym_ids = if identity.role == Role::Admin {
            self.admin_gyms.gyms_for_admin(identity.id).await?
        } else {
            Vec::new()
        };

        tracing::debug!(
            identity_id = identity.id,
            role = %identity.role,
            "Token validated successfully"
        );

        Ok(IdentityContext {
            identity: Arc::new(identity),
            admin_gym_ids,
            token_claims: Arc::new(verified.claims),
        })
    }
}

/// Extracts the bearer token from the `Authorization` header.
///
/// The scheme is matched case-insensitively. An empty token counts as absent.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// =============================================================================
// Middleware
// =============================================================================

/// Middleware that verifies the access token and attaches the identity.
///
/// Install with `axum::middleware::from_fn_with_state`.
///
/// # Errors
///
/// Rejects the request with the [`AuthError`] returned by
/// [`AuthState::authenticate`].
pub async fn verify_token(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = state.authenticate(request.headers()).await?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor yielding the authenticated [`IdentityContext`].
///
/// Reuses the context attached by [`verify_token`] when present and
/// otherwise authenticates the request itself.
pub struct BearerAuth(pub IdentityContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<IdentityContext>() {
            return Ok(BearerAuth(context.clone()));
        }

        let auth_state = AuthState::from_ref(state);
        let context = auth_state.authenticate(&parts.headers).await?;
        parts.extensions.insert(context.clone());
        Ok(BearerAuth(context))
    }
}

// =============================================================================
// Tests
// =============================================================================
