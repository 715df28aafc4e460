//! In-memory identity and admin-gym store.
//!
//! Used by the development server and by tests. All state lives behind one
//! `tokio::sync::RwLock`, so every write (including the refresh
//! compare-and-swap) is a single atomic step.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::admin_gym::{AdminGymAssignment, AdminGymStorage};
use crate::storage::identity::{Identity, IdentityStorage, NewIdentity, Role, TokenUpdate};

#[derive(Debug, Default)]
struct State {
    identities: HashMap<i64, Identity>,
    by_external_id: HashMap<String, i64>,
    assignments: Vec<AdminGymAssignment>,
    next_identity_id: i64,
    next_assignment_id: i64,
}

/// In-memory implementation of [`IdentityStorage`] and [`AdminGymStorage`].
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    state: RwLock<State>,
}

impl InMemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored identities.
    pub async fn len(&self) -> usize {
        self.state.read().await.identities.len()
    }

    /// Returns `true` if no identity is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdentityStorage for InMemoryIdentityStore {
    async fn find_by_id(&self, id: i64) -> AuthResult<Option<Identity>> {
        Ok(self.state.read().await.identities.get(&id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<Identity>> {
        let state = self.state.read().await;
        Ok(state
            .by_external_id
            .get(external_id)
            .and_then(|id| state.identities.get(id))
            .cloned())
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<Identity>> {
        if refresh_token.is_empty() {
            return Ok(None);
        }
        let state = self.state.read().await;
        Ok(state
            .identities
            .values()
            .find(|i| i.current_refresh_token.as_deref() == Some(refresh_token))
            .cloned())
    }

    async fn find_by_role(&self, role: Role) -> AuthResult<Vec<Identity>> {
        let state = self.state.read().await;
        let mut found: Vec<Identity> = state
            .identities
            .values()
            .filter(|i| i.role == role)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.id);
        Ok(found)
    }

    async fn create(&self, new: NewIdentity) -> AuthResult<Identity> {
        let mut state = self.state.write().await;

        if state.by_external_id.contains_key(&new.external_id) {
            return Err(AuthError::conflict(format!(
                "identity with external id '{}' already exists",
                new.external_id
            )));
        }
        if new.role == Role::SuperAdmin
            && state.identities.values().any(|i| i.role == Role::SuperAdmin)
        {
            return Err(AuthError::conflict("a super-admin already exists"));
        }

        state.next_identity_id += 1;
        let id = state.next_identity_id;
        let now = OffsetDateTime::now_utc();
        let identity = Identity {
            id,
            external_id: new.external_id,
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            current_access_token: None,
            current_refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        state.by_external_id.insert(identity.external_id.clone(), id);
        state.identities.insert(id, identity.clone());
        Ok(identity)
    }

    async fn update_tokens(&self, id: i64, update: TokenUpdate) -> AuthResult<Identity> {
        let mut state = self.state.write().await;
        let identity = state
            .identities
            .get_mut(&id)
            .ok_or_else(|| AuthError::unknown_subject(format!("identity {id} not found")))?;

        if let Some(expected) = update.expected_refresh_token.as_deref() {
            if identity.current_refresh_token.as_deref() != Some(expected) {
                return Err(AuthError::superseded_credential(
                    "refresh token has already been used",
                ));
            }
        }

        if let Some(access) = update.access_token {
            identity.current_access_token = Some(access);
        }
        if let Some(refresh) = update.refresh_token {
            identity.current_refresh_token = Some(refresh);
        }
        identity.updated_at = OffsetDateTime::now_utc();

        Ok(identity.clone())
    }
}

#[async_trait]
impl AdminGymStorage for InMemoryIdentityStore {
    async fn gyms_for_admin(&self, admin_id: i64) -> AuthResult<Vec<i64>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.admin_id == admin_id)
            .map(|a| a.gym_id)
            .collect())
    }

    async fn assign(&self, admin_id: i64, gym_id: i64) -> AuthResult<AdminGymAssignment> {
        let mut state = self.state.write().await;

        match state.identities.get(&admin_id) {
            None => {
                return Err(AuthError::unknown_subject(format!(
                    "identity {admin_id} not found"
                )));
            }
            Some(identity) if identity.role != Role::Admin => {
                return Err(AuthError::invalid_request(format!(
                    "identity {admin_id} is {}, only ADMIN identities can be assigned to a gym",
                    identity.role
                )));
            }
            Some(_) => {}
        }
        if state
            .assignments
            .iter()
            .any(|a| a.admin_id == admin_id && a.gym_id == gym_id)
        {
            return Err(AuthError::conflict(format!(
                "admin {admin_id} is already assigned to gym {gym_id}"
            )));
        }

        state.next_assignment_id += 1;
        let assignment = AdminGymAssignment {
            id: state.next_assignment_id,
            admin_id,
            gym_id,
        };
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn unassign(&self, admin_id: i64, gym_id: i64) -> AuthResult<bool> {
        let mut state = self.state.write().await;
        let before = state.assignments.len();
        state
            .assignments
            .retain(|a| !(a.admin_id == admin_id && a.gym_id == gym_id));
        Ok(state.assignments.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::block_on;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryIdentityStore::new();
        let created = store
            .create(NewIdentity::new("gh-1").username("octocat"))
            .await
            .unwrap();

        assert_eq!(created.role, Role::Customer);
        assert!(created.current_access_token.is_none());
        assert!(created.current_refresh_token.is_none());

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username.as_deref(), Some("octocat"));
        let by_external = store.find_by_external_id("gh-1").await.unwrap().unwrap();
        assert_eq!(by_external.id, created.id);
        assert!(store.find_by_external_id("gh-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_external_id_conflicts() {
        let store = InMemoryIdentityStore::new();
        store.create(NewIdentity::new("gh-1")).await.unwrap();
        let err = store.create(NewIdentity::new("gh-1")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_single_super_admin() {
        let store = InMemoryIdentityStore::new();
        store
            .create(NewIdentity::new("gh-1").role(Role::SuperAdmin))
            .await
            .unwrap();
        let err = store
            .create(NewIdentity::new("gh-2").role(Role::SuperAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict { .. }));
        assert_eq!(store.find_by_role(Role::SuperAdmin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_tokens_and_lookup_by_refresh() {
        let store = InMemoryIdentityStore::new();
        let identity = store.create(NewIdentity::new("gh-1")).await.unwrap();

        let updated = store
            .update_tokens(identity.id, TokenUpdate::pair("a1", "r1"))
            .await
            .unwrap();
        assert_eq!(updated.current_access_token.as_deref(), Some("a1"));

        let found = store.find_by_refresh_token("r1").await.unwrap().unwrap();
        assert_eq!(found.id, identity.id);
        assert!(store.find_by_refresh_token("r2").await.unwrap().is_none());
        assert!(store.find_by_refresh_token("").await.unwrap().is_none());
    }

    #[test]
    fn test_update_unknown_identity() {
        let store = InMemoryIdentityStore::new();
        block_on(async {
            let err = store
                .update_tokens(99, TokenUpdate::pair("a", "r"))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::UnknownSubject { .. }));
            assert!(store.is_empty().await);
        });
    }

    #[tokio::test]
    async fn test_refresh_precondition_is_compare_and_swap() {
        let store = InMemoryIdentityStore::new();
        let identity = store.create(NewIdentity::new("gh-1")).await.unwrap();
        store
            .update_tokens(identity.id, TokenUpdate::pair("a1", "r1"))
            .await
            .unwrap();

        store
            .update_tokens(
                identity.id,
                TokenUpdate::pair("a2", "r2").if_refresh_token_is("r1"),
            )
            .await
            .unwrap();

        let err = store
            .update_tokens(
                identity.id,
                TokenUpdate::pair("a3", "r3").if_refresh_token_is("r1"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SupersededCredential { .. }));

        let current = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert_eq!(current.current_refresh_token.as_deref(), Some("r2"));
        assert_eq!(current.current_access_token.as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_identity() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(NewIdentity::new("gh-race")).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_admin_gym_assignments() {
        let store = InMemoryIdentityStore::new();
        let admin = store
            .create(NewIdentity::new("gh-admin").role(Role::Admin))
            .await
            .unwrap();

        store.assign(admin.id, 7).await.unwrap();
        assert!(matches!(
            store.assign(admin.id, 7).await,
            Err(AuthError::Conflict { .. })
        ));
        assert!(matches!(
            store.assign(404, 7).await,
            Err(AuthError::UnknownSubject { .. })
        ));

        for role in [Role::Customer, Role::Coach, Role::SuperAdmin] {
            let other = store
                .create(NewIdentity::new(format!("gh-{role}")).role(role))
                .await
                .unwrap();
            assert!(matches!(
                store.assign(other.id, 7).await,
                Err(AuthError::InvalidRequest { .. })
            ));
            assert!(store.gyms_for_admin(other.id).await.unwrap().is_empty());
        }

        assert!(store.is_admin_of(admin.id, 7).await.unwrap());
        assert!(!store.is_admin_of(admin.id, 9).await.unwrap());
        assert_eq!(store.gyms_for_admin(admin.id).await.unwrap(), vec![7]);

        assert!(store.unassign(admin.id, 7).await.unwrap());
        assert!(!store.unassign(admin.id, 7).await.unwrap());
        assert!(store.gyms_for_admin(admin.id).await.unwrap().is_empty());
    }
}
