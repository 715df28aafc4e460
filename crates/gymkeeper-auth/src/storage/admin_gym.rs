//! Admin-to-gym assignment storage trait.
//!
//! Assignments are CRUD data owned by the admin controllers. The auth core
//! only reads them to answer "is this admin assigned to that gym".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

/// Pairs an admin identity with a gym it administers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminGymAssignment {
    /// Assignment identifier.
    pub id: i64,
    /// Admin identity id.
    pub admin_id: i64,
    /// Gym id.
    pub gym_id: i64,
}

/// Storage operations for admin-gym assignments.
#[async_trait]
pub trait AdminGymStorage: Send + Sync {
    /// Lists the gym ids assigned to `admin_id`.
    async fn gyms_for_admin(&self, admin_id: i64) -> AuthResult<Vec<i64>>;

    /// Assigns `admin_id` to `gym_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the pair already exists,
    /// `AuthError::UnknownSubject` if the identity does not exist and
    /// `AuthError::InvalidRequest` if the identity is not an admin.
    async fn assign(&self, admin_id: i64, gym_id: i64) -> AuthResult<AdminGymAssignment>;

    /// Removes an assignment. Returns `false` if it did not exist.
    async fn unassign(&self, admin_id: i64, gym_id: i64) -> AuthResult<bool>;

    /// Returns `true` if `admin_id` is assigned to `gym_id`.
    async fn is_admin_of(&self, admin_id: i64, gym_id: i64) -> AuthResult<bool> {
        Ok(self.gyms_for_admin(admin_id).await?.contains(&gym_id))
    }
}
