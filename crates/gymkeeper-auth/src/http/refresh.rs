//! Refresh endpoint handler.
//!
//! Serves both `/api/v1/auth/refresh_token` and
//! `/api/v1/auth/new_refresh_token`; each performs a full rotation.
//!
//! ```text
//! POST /api/v1/auth/refresh_token
//! Content-Type: application/json
//!
//! {"refreshToken": "..."}
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;

use crate::error::AuthError;
use crate::token::TokenPair;

use super::{ApiResponse, AuthHttpState};

/// Refresh request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token to rotate.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Rotates the caller's token pair.
///
/// # Errors
///
/// - `InvalidRequest` (400) if the body is not JSON or lacks `refreshToken`
/// - `SupersededCredential`, `ExpiredCredential` or `MalformedCredential`
///   (403) if the refresh token is not live
pub async fn refresh_handler(
    State(state): State<AuthHttpState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<ApiResponse<TokenPair>, AuthError> {
    let Json(request) = body.map_err(|e| AuthError::invalid_request(e.body_text()))?;
    let refresh_token = request
        .refresh_token
        .ok_or_else(|| AuthError::invalid_request("refreshToken is required"))?;

    let pair = state.refresh.refresh(&refresh_token).await?;
    Ok(ApiResponse::new("Tokens refreshed successfully", pair))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::http::test_support::{Fixture, get, post_json};
    use crate::storage::Role;

    #[tokio::test]
    async fn test_refresh_then_use_new_access_token() {
        let fixture = Fixture::new();
        let (_, login) = fixture.login_as("gh-1", Role::Customer).await;

        let (status, body) = fixture
            .send(post_json(
                "/api/v1/auth/refresh_token",
                json!({"refreshToken": login.refresh_token}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["data"]["access_token"].as_str().unwrap().to_string();

        let (status, _) = fixture
            .send(get("/api/v1/user/getMe", Some(&access)))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = fixture
            .send(get("/api/v1/user/getMe", Some(&login.access_token)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "token_superseded");
    }

    #[tokio::test]
    async fn test_both_paths_rotate_and_old_token_dies() {
        let fixture = Fixture::new();
        let (_, login) = fixture.login_as("gh-1", Role::Customer).await;

        let (status, body) = fixture
            .send(post_json(
                "/api/v1/auth/new_refresh_token",
                json!({"refreshToken": login.refresh_token}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let rotated = body["data"]["refresh_token"].as_str().unwrap().to_string();

        let (status, _) = fixture
            .send(post_json(
                "/api/v1/auth/refresh_token",
                json!({"refreshToken": login.refresh_token}),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = fixture
            .send(post_json(
                "/api/v1/auth/refresh_token",
                json!({"refreshToken": rotated}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_is_bad_request() {
        let fixture = Fixture::new();
        let (status, body) = fixture
            .send(post_json("/api/v1/auth/refresh_token", json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_refresh_token_is_forbidden() {
        let fixture = Fixture::new();
        let (status, _) = fixture
            .send(post_json(
                "/api/v1/auth/refresh_token",
                json!({"refreshToken": "not-a-token"}),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
