//! Super-admin bootstrap handlers.
//!
//! At most one super-admin exists. `create` registers it together with a
//! token pair so the platform owner can start assigning admins; `getMe`
//! shows who holds the role.
//!
//! ```text
//! POST /api/v1/superAdmin/create
//! {"user_github_platform_id": 583231, "username": "octocat", "email": "octocat@github.com"}
//!
//! -> 201 {"success": true, "message": "...",
//!         "data": {"admin": {...}, "tokens": {"access_token": "...", ...}}}
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{Identity, NewIdentity, Role, TokenUpdate};
use crate::token::TokenPair;

use super::{ApiResponse, AuthHttpState};

/// Super-admin creation request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSuperAdminRequest {
    /// GitHub user id, as a number or a string.
    #[serde(default)]
    pub user_github_platform_id: Option<Value>,

    /// Login name.
    #[serde(default)]
    pub username: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl CreateSuperAdminRequest {
    /// Validates the request and converts it into a new identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` if the username is blank, the email
    /// has no `@` or the external id is missing.
    pub fn into_new_identity(self) -> AuthResult<NewIdentity> {
        let username = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AuthError::invalid_request("username is required"))?
            .to_string();

        let email = self
            .email
            .filter(|e| e.contains('@'))
            .ok_or_else(|| AuthError::invalid_request("a valid email is required"))?;

        let external_id = match self.user_github_platform_id {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                return Err(AuthError::invalid_request(
                    "user_github_platform_id is required",
                ));
            }
        };

        Ok(NewIdentity::new(external_id)
            .username(username)
            .email(email)
            .role(Role::SuperAdmin))
    }
}

/// Payload returned on creation.
#[derive(Debug, Serialize)]
pub struct CreatedSuperAdmin {
    /// The new super-admin.
    pub admin: Identity,
    /// Its tokens.
    pub tokens: TokenPair,
}

/// Creates the platform super-admin.
///
/// # Errors
///
/// - `InvalidRequest` (400) for a malformed body
/// - `Conflict` (409) if a super-admin already exists or the external id is
///   taken
pub async fn create_handler(
    State(state): State<AuthHttpState>,
    body: Result<Json<CreateSuperAdminRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(request) = body.map_err(|e| AuthError::invalid_request(e.body_text()))?;
    let new_identity = request.into_new_identity()?;

    let identities = &state.auth.identities;
    if !identities.find_by_role(Role::SuperAdmin).await?.is_empty() {
        return Err(AuthError::conflict("a super-admin already exists"));
    }

    let created = identities.create(new_identity).await?;
    let tokens = state.auth.tokens.issue_rotated_pair(created.id)?;
    let admin = identities
        .update_tokens(
            created.id,
            TokenUpdate::pair(&tokens.access_token, &tokens.refresh_token),
        )
        .await?;

    tracing::info!(identity_id = admin.id, "Super-admin created");

    Ok(
        ApiResponse::new("Super-admin created", CreatedSuperAdmin { admin, tokens })
            .with_status(StatusCode::CREATED),
    )
}

/// Returns the super-admin's public profile.
///
/// # Errors
///
/// Returns `UnknownSubject` (404) if no super-admin exists.
pub async fn get_handler(
    State(state): State<AuthHttpState>,
) -> Result<ApiResponse<Identity>, AuthError> {
    let admin = state
        .auth
        .identities
        .find_by_role(Role::SuperAdmin)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AuthError::unknown_subject("no super-admin exists"))?;

    Ok(ApiResponse::new("Super-admin found", admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::http::test_support::{Fixture, get, post_json};
    use crate::token::TokenKind;

    fn body() -> Value {
        json!({
            "user_github_platform_id": 583231,
            "username": " octocat ",
            "email": "octocat@github.com"
        })
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let fixture = Fixture::new();

        let (status, created) = fixture
            .send(post_json("/api/v1/superAdmin/create", body()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["admin"]["role"], "SUPER_ADMIN");
        assert_eq!(created["data"]["admin"]["username"], "octocat");
        assert_eq!(created["data"]["admin"]["externalId"], "583231");

        let refresh = created["data"]["tokens"]["refresh_token"].as_str().unwrap();
        let verified = fixture
            .state
            .auth
            .tokens
            .verify(refresh, TokenKind::Refresh)
            .unwrap();
        assert_eq!(verified.claims.exp - verified.claims.iat, 20 * 3600);

        let access = created["data"]["tokens"]["access_token"].as_str().unwrap();
        let (status, _) = fixture
            .send(get("/api/v1/user/getMe", Some(access)))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, found) = fixture.send(get("/api/v1/superAdmin/getMe", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["data"]["id"], created["data"]["admin"]["id"]);
    }

    #[tokio::test]
    async fn test_second_super_admin_conflicts() {
        let fixture = Fixture::new();
        fixture
            .send(post_json("/api/v1/superAdmin/create", body()))
            .await;

        let (status, body) = fixture
            .send(post_json(
                "/api/v1/superAdmin/create",
                json!({"user_github_platform_id": "1", "username": "other", "email": "o@x.io"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_validation() {
        let fixture = Fixture::new();
        for invalid in [
            json!({"user_github_platform_id": 1, "username": "  ", "email": "a@b.c"}),
            json!({"user_github_platform_id": 1, "username": "a", "email": "nope"}),
            json!({"username": "a", "email": "a@b.c"}),
            json!({"user_github_platform_id": "", "username": "a", "email": "a@b.c"}),
        ] {
            let (status, _) = fixture
                .send(post_json("/api/v1/superAdmin/create", invalid))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        assert!(fixture.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_without_super_admin_is_not_found() {
        let fixture = Fixture::new();
        let (status, _) = fixture.send(get("/api/v1/superAdmin/getMe", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
