//! Identity storage trait.
//!
//! The identity store is the persistence collaborator of the auth core. The
//! core never issues raw queries; it only calls the operations on
//! [`IdentityStorage`].

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

// =============================================================================
// Role
// =============================================================================

/// Coarse permission tier of an identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unprivileged gym customer. Default for OAuth registrations.
    #[default]
    Customer,
    /// Coach.
    Coach,
    /// Gym administrator, scoped to assigned gyms.
    Admin,
    /// Platform owner. At most one exists.
    SuperAdmin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 4] = [Role::Customer, Role::Coach, Role::Admin, Role::SuperAdmin];

    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Coach => "COACH",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "COACH" => Ok(Self::Coach),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// A stored user identity.
///
/// The two token fields hold the only live credentials for the identity.
/// They are never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Internal identifier.
    pub id: i64,

    /// Identifier assigned by the OAuth provider. Immutable.
    pub external_id: String,

    /// Provider login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Permission tier.
    pub role: Role,

    /// The access token issued most recently, if any.
    #[serde(skip_serializing)]
    pub current_access_token: Option<String>,

    /// The refresh token issued most recently, if any.
    #[serde(skip_serializing)]
    pub current_refresh_token: Option<String>,

    /// When the identity was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the identity was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Identity {
    /// Returns the stored access token when it is set and non-empty.
    #[must_use]
    pub fn live_access_token(&self) -> Option<&str> {
        self.current_access_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    /// Returns the stored refresh token when it is set and non-empty.
    #[must_use]
    pub fn live_refresh_token(&self) -> Option<&str> {
        self.current_refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    /// Returns `true` if the identity holds the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Fields required to create an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    /// Provider identifier.
    pub external_id: String,
    /// Provider login name.
    pub username: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Initial role.
    pub role: Role,
}

impl NewIdentity {
    /// Creates a customer identity with only the external id set.
    #[must_use]
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            username: None,
            email: None,
            first_name: None,
            last_name: None,
            role: Role::default(),
        }
    }

    /// Sets the username.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the email.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

// =============================================================================
// Token update
// =============================================================================

/// A write to the stored credential fields of an identity.
///
/// `None` leaves a field untouched. When `expected_refresh_token` is set the
/// write only applies if the stored refresh token still equals it, which
/// makes a refresh a compare-and-swap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUpdate {
    /// New access token.
    pub access_token: Option<String>,
    /// New refresh token.
    pub refresh_token: Option<String>,
    /// Precondition on the currently stored refresh token.
    pub expected_refresh_token: Option<String>,
}

impl TokenUpdate {
    /// Replaces both stored tokens.
    #[must_use]
    pub fn pair(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            expected_refresh_token: None,
        }
    }

    /// Adds the precondition that the stored refresh token is `expected`.
    #[must_use]
    pub fn if_refresh_token_is(mut self, expected: impl Into<String>) -> Self {
        self.expected_refresh_token = Some(expected.into());
        self
    }
}

// =============================================================================
// Storage trait
// =============================================================================

/// Storage operations for identities.
///
/// Implementations must apply [`IdentityStorage::update_tokens`] atomically:
/// the precondition check and the write happen as one step.
#[async_trait]
pub trait IdentityStorage: Send + Sync {
    /// Finds an identity by internal id.
    async fn find_by_id(&self, id: i64) -> AuthResult<Option<Identity>>;

    /// Finds an identity by provider id.
    async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<Identity>>;

    /// Finds the identity whose stored refresh token equals `refresh_token`.
    async fn find_by_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<Identity>>;

    /// Lists identities holding `role`.
    async fn find_by_role(&self, role: Role) -> AuthResult<Vec<Identity>>;

    /// Creates an identity with empty credential fields.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the external id is taken or if the
    /// new identity is a super-admin and one already exists.
    async fn create(&self, identity: NewIdentity) -> AuthResult<Identity>;

    /// Writes credential fields and returns the updated identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownSubject` if no identity has `id` and
    /// `AuthError::SupersededCredential` if the refresh precondition fails.
    async fn update_tokens(&self, id: i64, update: TokenUpdate) -> AuthResult<Identity>;
}
