//! Capability predicate for role and gym-scope checks.

use serde::Serialize;

use crate::error::AuthError;
use crate::storage::Role;

// =============================================================================
// Permission
// =============================================================================

/// What an operation requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    /// Roles allowed to perform the operation. Membership is exact; no role
    /// implies another.
    pub roles: &'static [Role],

    /// Whether the operation targets a single gym. Admins then need an
    /// assignment to that gym; super-admins always pass.
    pub gym_scoped: bool,
}

impl Permission {
    /// A global permission for the given roles.
    #[must_use]
    pub const fn roles(roles: &'static [Role]) -> Self {
        Self {
            roles,
            gym_scoped: false,
        }
    }

    /// A gym-scoped permission for the given roles.
    #[must_use]
    pub const fn gym_scoped(roles: &'static [Role]) -> Self {
        Self {
            roles,
            gym_scoped: true,
        }
    }

    /// Returns `true` if `role` is listed.
    #[must_use]
    pub fn permits_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// The resource an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    /// Not tied to a gym.
    Global,
    /// A single gym.
    Gym(i64),
}

/// The caller as seen by the policy.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    /// Caller role.
    pub role: Role,
    /// Gyms the caller administers.
    pub admin_gym_ids: &'a [i64],
}

// =============================================================================
// Decision
// =============================================================================

/// Outcome of [`can_act`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is granted.
    Allow,
    /// Access is denied with a reason.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns `true` if access was denied.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// Get the deny reason if access was denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow => None,
        }
    }

    /// Converts a denial into the matching [`AuthError`].
    ///
    /// # Errors
    ///
    /// Returns `RoleForbidden` or `ResourceScopeForbidden` for a denial.
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason.into()),
        }
    }
}

/// Why access was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyReason {
    /// Denial kind.
    pub code: DenyCode,

    /// Human-readable error message.
    pub message: String,
}

/// Denial kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyCode {
    /// The caller's role is not listed.
    RoleNotPermitted,
    /// The caller is an admin but not of the targeted gym.
    GymNotAssigned,
}

impl DenyReason {
    /// Create a denial for an unlisted role.
    #[must_use]
    pub fn role_not_permitted(role: Role) -> Self {
        Self {
            code: DenyCode::RoleNotPermitted,
            message: format!("role {role} is not permitted to perform this operation"),
        }
    }

    /// Create a denial for a gym the caller does not administer.
    #[must_use]
    pub fn gym_not_assigned(scope: ResourceScope) -> Self {
        let message = match scope {
            ResourceScope::Gym(gym_id) => format!("not an administrator of gym {gym_id}"),
            ResourceScope::Global => "operation requires a gym the caller administers".to_string(),
        };
        Self {
            code: DenyCode::GymNotAssigned,
            message,
        }
    }
}

impl From<DenyReason> for AuthError {
    fn from(reason: DenyReason) -> Self {
        match reason.code {
            DenyCode::RoleNotPermitted => AuthError::role_forbidden(reason.message),
            DenyCode::GymNotAssigned => AuthError::resource_scope_forbidden(reason.message),
        }
    }
}

/// Decides whether `actor` may perform an operation requiring `permission`
/// on `scope`.
///
/// The role check runs first. For gym-scoped permissions a super-admin is
/// always allowed and any other permitted role must administer the gym.
#[must_use]
pub fn can_act(actor: Actor<'_>, permission: Permission, scope: ResourceScope) -> AccessDecision {
    if !permission.permits_role(actor.role) {
        return AccessDecision::Deny(DenyReason::role_not_permitted(actor.role));
    }

    if !permission.gym_scoped || actor.role == Role::SuperAdmin {
        return AccessDecision::Allow;
    }

    match scope {
        ResourceScope::Gym(gym_id) if actor.admin_gym_ids.contains(&gym_id) => AccessDecision::Allow,
        _ => AccessDecision::Deny(DenyReason::gym_not_assigned(scope)),
    }
}
