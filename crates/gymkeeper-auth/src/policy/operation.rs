//! Capability table for the gym-management API.
//!
//! Each protected route names an [`Operation`]; the operation yields the
//! [`Permission`] the role middleware enforces.

use std::fmt;

use crate::policy::decision::Permission;
use crate::storage::Role;

const EVERYONE: &[Role] = &Role::ALL;
const SUPER_ADMIN: &[Role] = &[Role::SuperAdmin];
const ADMIN: &[Role] = &[Role::Admin];
const GYM_MANAGERS: &[Role] = &[Role::SuperAdmin, Role::Admin];

/// Protected operations of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read the caller's own profile.
    ViewSelf,

    /// Create or delete gyms.
    ManageGyms,
    /// Edit the details of one gym.
    UpdateGym,
    /// Create, edit or delete sports.
    ManageSports,
    /// Create, edit or delete admin accounts.
    ManageAdmins,
    /// Assign admins to gyms.
    ManageAdminGyms,

    /// Manage coaches.
    ManageCoaches,
    /// Manage customers.
    ManageCustomers,
    /// Manage the sports a gym offers.
    ManageGymSports,
    /// Manage gym memberships.
    ManageGymMemberships,
    /// Manage sport memberships.
    ManageSportMemberships,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 11] = [
        Operation::ViewSelf,
        Operation::ManageGyms,
        Operation::UpdateGym,
        Operation::ManageSports,
        Operation::ManageAdmins,
        Operation::ManageAdminGyms,
        Operation::ManageCoaches,
        Operation::ManageCustomers,
        Operation::ManageGymSports,
        Operation::ManageGymMemberships,
        Operation::ManageSportMemberships,
    ];

    /// Returns the permission required for this operation.
    #[must_use]
    pub const fn permission(self) -> Permission {
        match self {
            Self::ViewSelf => Permission::roles(EVERYONE),
            Self::ManageGyms | Self::ManageSports | Self::ManageAdmins | Self::ManageAdminGyms => {
                Permission::roles(SUPER_ADMIN)
            }
            Self::UpdateGym => Permission::gym_scoped(GYM_MANAGERS),
            Self::ManageCoaches
            | Self::ManageCustomers
            | Self::ManageGymSports
            | Self::ManageGymMemberships
            | Self::ManageSportMemberships => Permission::roles(ADMIN),
        }
    }

    /// Returns a stable name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewSelf => "view_self",
            Self::ManageGyms => "manage_gyms",
            Self::UpdateGym => "update_gym",
            Self::ManageSports => "manage_sports",
            Self::ManageAdmins => "manage_admins",
            Self::ManageAdminGyms => "manage_admin_gyms",
            Self::ManageCoaches => "manage_coaches",
            Self::ManageCustomers => "manage_customers",
            Self::ManageGymSports => "manage_gym_sports",
            Self::ManageGymMemberships => "manage_gym_memberships",
            Self::ManageSportMemberships => "manage_sport_memberships",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
