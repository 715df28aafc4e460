//! Token service for issuing and verifying gymkeeper tokens.
//!
//! Issuance is a pure function of `(identity id, now, secret)`. Three
//! lifetimes exist:
//!
//! - access tokens (default 1h)
//! - refresh tokens handed out on login (default 5h)
//! - rotated refresh tokens handed out on every refresh cycle (default 20h)
//!
//! # Usage
//!
//! ```ignore
//! use gymkeeper_auth::token::{TokenKind, TokenService};
//!
//! let service = TokenService::from_config(&config)?;
//! let pair = service.issue_login_pair(identity.id)?;
//! let verified = service.verify(&pair.access_token, TokenKind::Access)?;
//! ```

use std::time::Duration as StdDuration;

use serde::Serialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::{AuthConfig, TokenConfig};
use crate::error::AuthError;
use crate::token::jwt::{JwtError, JwtService, TokenClaims, TokenKind};

/// Lifetime tier a token is issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTier {
    /// Access token.
    Access,
    /// Refresh token issued on login.
    Refresh,
    /// Refresh token issued on rotation.
    RotatedRefresh,
}

impl TokenTier {
    /// Returns the token kind written into the `typ` claim.
    #[must_use]
    pub fn kind(self) -> TokenKind {
        match self {
            Self::Access => TokenKind::Access,
            Self::Refresh | Self::RotatedRefresh => TokenKind::Refresh,
        }
    }
}

/// An access/refresh pair handed back to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenPair {
    /// The access token.
    pub access_token: String,

    /// The refresh token.
    pub refresh_token: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// A token that passed signature, expiry and kind checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// The identity id the token was issued for.
    pub subject: i64,

    /// The decoded claims.
    pub claims: TokenClaims,
}

/// Issues and verifies signed tokens.
#[derive(Debug)]
pub struct TokenService {
    jwt: JwtService,
    lifetimes: TokenConfig,
}

impl TokenService {
    /// Creates a token service from a signing secret and lifetimes.
    #[must_use]
    pub fn new(secret: &str, lifetimes: TokenConfig) -> Self {
        Self {
            jwt: JwtService::from_secret(secret.as_bytes()),
            lifetimes,
        }
    }

    /// Creates a token service from the auth configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if no signing secret is configured.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let secret = config
            .signing_secret()
            .ok_or_else(|| AuthError::configuration("token signing secret is not configured"))?;
        Ok(Self::new(secret, config.tokens.clone()))
    }

    /// Returns the configured lifetime for a tier.
    #[must_use]
    pub fn lifetime(&self, tier: TokenTier) -> StdDuration {
        match tier {
            TokenTier::Access => self.lifetimes.access_token_lifetime,
            TokenTier::Refresh => self.lifetimes.refresh_token_lifetime,
            TokenTier::RotatedRefresh => self.lifetimes.rotated_refresh_token_lifetime,
        }
    }

    /// Issues a token for `subject` as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_at(&self, tier: TokenTier, subject: i64, now: OffsetDateTime) -> AuthResult<String> {
        let lifetime = i64::try_from(self.lifetime(tier).as_secs()).unwrap_or(i64::MAX / 2);
        let claims = TokenClaims::new(subject, tier.kind(), now, lifetime);

        self.jwt
            .encode(&claims)
            .map_err(|e| AuthError::internal(e.to_string()))
    }

    /// Issues an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_access_token(&self, subject: i64) -> AuthResult<String> {
        self.issue_at(TokenTier::Access, subject, OffsetDateTime::now_utc())
    }

    /// Issues a standard-tier refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_refresh_token(&self, subject: i64) -> AuthResult<String> {
        self.issue_at(TokenTier::Refresh, subject, OffsetDateTime::now_utc())
    }

    /// Issues a rotated-tier refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_rotated_refresh_token(&self, subject: i64) -> AuthResult<String> {
        self.issue_at(TokenTier::RotatedRefresh, subject, OffsetDateTime::now_utc())
    }

    /// Issues the pair handed out on login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_login_pair(&self, subject: i64) -> AuthResult<TokenPair> {
        Ok(self.pair(
            self.issue_access_token(subject)?,
            self.issue_refresh_token(subject)?,
        ))
    }

    /// Issues the pair handed out on rotation.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_rotated_pair(&self, subject: i64) -> AuthResult<TokenPair> {
        Ok(self.pair(
            self.issue_access_token(subject)?,
            self.issue_rotated_refresh_token(subject)?,
        ))
    }

    fn pair(&self, access_token: String, refresh_token: String) -> TokenPair {
        TokenPair {
            access_token,
            refresh_token,
            expires_in: self.lifetimes.access_token_lifetime.as_secs(),
        }
    }

    /// Verifies a token's signature, expiry and kind.
    ///
    /// # Errors
    ///
    /// - `AuthError::ExpiredCredential` if the token is past its expiry.
    /// - `AuthError::MalformedCredential` for any other decode failure or a
    ///   token of the wrong kind.
    /// - `AuthError::InvalidRequest` if the subject is not an identity id.
    pub fn verify(&self, token: &str, expected: TokenKind) -> AuthResult<VerifiedToken> {
        let data = self.jwt.decode::<TokenClaims>(token).map_err(|e| match e {
            JwtError::Expired => AuthError::expired_credential(format!("{expected} token has expired")),
            other => AuthError::malformed_credential(format!("{expected} token is invalid: {other}")),
        })?;

        let claims = data.claims;
        if claims.typ != expected {
            return Err(AuthError::malformed_credential(format!(
                "expected {expected} token, got {}",
                claims.typ
            )));
        }

        let subject = claims
            .subject_id()
            .map_err(|e| AuthError::invalid_request(e.to_string()))?;

        Ok(VerifiedToken { subject, claims })
    }
}
