//! Current-user profile handler.

use axum::Extension;
use serde::Serialize;

use crate::middleware::IdentityContext;
use crate::storage::Identity;

use super::ApiResponse;

/// Public view of the authenticated identity. Token strings are not part of
/// it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    /// Stored identity fields.
    #[serde(flatten)]
    pub identity: Identity,

    /// Gyms the identity administers.
    pub admin_gym_ids: Vec<i64>,
}

/// Returns the caller's profile.
///
/// Mounted behind `verify_token`, which attaches the [`IdentityContext`].
pub async fn get_me_handler(
    Extension(context): Extension<IdentityContext>,
) -> ApiResponse<ProfileView> {
    let view = ProfileView {
        identity: Identity::clone(&context.identity),
        admin_gym_ids: context.admin_gym_ids,
    };
    ApiResponse::new("User found successfully", view)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::http::test_support::{Fixture, get};
    use crate::storage::{AdminGymStorage, Role};

    #[tokio::test]
    async fn test_get_me_returns_profile_without_tokens() {
        let fixture = Fixture::new();
        let (id, login) = fixture.login_as("gh-1", Role::Customer).await;

        let (status, body) = fixture
            .send(get("/api/v1/user/getMe", Some(&login.access_token)))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id);
        assert_eq!(body["data"]["role"], "CUSTOMER");
        assert_eq!(body["data"]["adminGymIds"], serde_json::json!([]));
        assert!(!body.to_string().contains(&login.access_token));
        assert!(!body.to_string().contains(&login.refresh_token));
    }

    #[tokio::test]
    async fn test_get_me_lists_admin_gyms() {
        let fixture = Fixture::new();
        let (id, login) = fixture.login_as("gh-a", Role::Admin).await;
        fixture.store.assign(id, 7).await.unwrap();
        fixture.store.assign(id, 3).await.unwrap();

        let (_, body) = fixture
            .send(get("/api/v1/user/getMe", Some(&login.access_token)))
            .await;
        let gyms = body["data"]["adminGymIds"].as_array().unwrap();
        assert_eq!(gyms.len(), 2);
    }

    #[tokio::test]
    async fn test_get_me_requires_token() {
        let fixture = Fixture::new();
        let (status, body) = fixture.send(get("/api/v1/user/getMe", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_credential");
    }
}
