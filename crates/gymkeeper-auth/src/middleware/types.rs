//! Authentication context types.
//!
//! This module provides the identity context attached to a request once its
//! access token has been verified.

use std::sync::Arc;

use crate::policy::Actor;
use crate::storage::{Identity, Role};
use crate::token::TokenClaims;

// =============================================================================
// Identity Context
// =============================================================================

/// Authenticated request context.
///
/// Inserted into the request extensions by the token verification
/// middleware and read by the role middleware and by handlers.
///
/// The identity and claims are wrapped in `Arc` to allow cheap cloning
/// when passing across async boundaries.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    /// The stored identity the token resolved to.
    pub identity: Arc<Identity>,

    /// Gyms the identity administers. Empty for non-admins.
    pub admin_gym_ids: Vec<i64>,

    /// Validated access token claims.
    pub token_claims: Arc<TokenClaims>,
}

impl IdentityContext {
    /// Returns the identity id.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.identity.id
    }

    /// Returns the identity role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.identity.role
    }

    /// Returns `true` if the identity holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.identity.has_role(role)
    }

    /// Returns `true` if the identity administers `gym_id`.
    #[must_use]
    pub fn administers(&self, gym_id: i64) -> bool {
        self.admin_gym_ids.contains(&gym_id)
    }

    /// Returns the caller as seen by the policy.
    #[must_use]
    pub fn actor(&self) -> Actor<'_> {
        Actor {
            role: self.identity.role,
            admin_gym_ids: &self.admin_gym_ids,
        }
    }
}
