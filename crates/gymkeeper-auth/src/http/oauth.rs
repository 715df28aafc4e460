//! GitHub login and callback handlers.
//!
//! ```text
//! GET /api/v1/auth/github/login
//!   -> 303 See Other, Location: <provider authorize URL with state>
//!
//! GET /api/v1/auth/github/callback?code=...&state=...
//!   -> 200 (login) or 201 (registration)
//!      {"success": true, "message": "...",
//!       "data": {"access_token": "...", "refresh_token": "...", "expires_in": 3600}}
//! ```

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::AuthError;
use crate::federation::AuthorizationContext;

use super::{ApiResponse, AuthHttpState};

/// Query parameters the provider appends to the callback URL.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    #[serde(default)]
    pub code: Option<String>,

    /// State issued by the login handler.
    #[serde(default)]
    pub state: Option<String>,

    /// Set by the provider when the user declined.
    #[serde(default)]
    pub error: Option<String>,

    /// Provider description of `error`.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Redirects the browser to the provider's authorization page.
///
/// # Errors
///
/// Returns `AuthError::Configuration` if the provider URL cannot be built.
pub async fn login_handler(State(state): State<AuthHttpState>) -> Result<Redirect, AuthError> {
    let oauth_state = state.oauth_states.issue().await;
    let url = state
        .provider
        .authorization_url(&oauth_state)
        .map_err(|e| AuthError::configuration(format!("authorization URL: {e}")))?;

    tracing::debug!(provider = state.provider.id(), "Redirecting to OAuth provider");
    Ok(Redirect::to(url.as_str()))
}

/// Completes an OAuth login.
///
/// # Errors
///
/// - `InvalidRequest` (400) if `code` or `state` is missing, the state is
///   unknown or expired, or the provider reports that the user declined
/// - `IdentityProvider` (502) if the code exchange or profile lookup fails
pub async fn callback_handler(
    State(state): State<AuthHttpState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AuthError> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        tracing::debug!(%error, %description, "Provider returned an authorization error");
        return Err(AuthError::invalid_request(format!(
            "authorization was not granted: {error}"
        )));
    }

    let oauth_state = non_empty(params.state, "state")?;
    let code = non_empty(params.code, "code")?;

    state.oauth_states.consume(&oauth_state).await?;

    let outcome = state
        .bridge
        .authenticate(state.provider.as_ref(), &AuthorizationContext::new(code))
        .await?;

    let response = if outcome.is_registration() {
        ApiResponse::new("You have successfully registered", outcome.tokens)
            .with_status(StatusCode::CREATED)
    } else {
        ApiResponse::new("You have logged in successfully", outcome.tokens).into_response()
    };
    Ok(response)
}

fn non_empty(value: Option<String>, name: &str) -> Result<String, AuthError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AuthError::invalid_request(format!("missing '{name}' parameter")))
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use crate::http::router;
    use crate::http::test_support::{Fixture, get};
    use crate::storage::{IdentityStorage, Role};
    use crate::token::TokenKind;

    async fn issued_state(fixture: &Fixture) -> String {
        let response = router(fixture.state.clone())
            .oneshot(get("/api/v1/auth/github/login", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        let url = url::Url::parse(location).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_login_registers() {
        let fixture = Fixture::new();
        let state = issued_state(&fixture).await;

        let (status, body) = fixture
            .send(get(
                &format!("/api/v1/auth/github/callback?code=good&state={state}"),
                None,
            ))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        let access = body["data"]["access_token"].as_str().unwrap();
        assert!(!body["data"]["refresh_token"].as_str().unwrap().is_empty());
        assert_eq!(body["data"]["expires_in"], 3600);

        let verified = fixture
            .state
            .auth
            .tokens
            .verify(access, TokenKind::Access)
            .unwrap();
        let identity = fixture
            .store
            .find_by_id(verified.subject)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.role, Role::Customer);
        assert_eq!(identity.first_name.as_deref(), Some("The"));
    }

    #[tokio::test]
    async fn test_second_login_is_ok_not_created() {
        let fixture = Fixture::new();
        for expected in [StatusCode::CREATED, StatusCode::OK] {
            let state = issued_state(&fixture).await;
            let (status, _) = fixture
                .send(get(
                    &format!("/api/v1/auth/github/callback?code=good&state={state}"),
                    None,
                ))
                .await;
            assert_eq!(status, expected);
        }
        assert_eq!(fixture.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_state_cannot_be_replayed() {
        let fixture = Fixture::new();
        let state = issued_state(&fixture).await;
        let uri = format!("/api/v1/auth/github/callback?code=good&state={state}");

        fixture.send(get(&uri, None)).await;
        let (status, body) = fixture.send(get(&uri, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_missing_code_is_bad_request() {
        let fixture = Fixture::new();
        let state = issued_state(&fixture).await;
        let (status, _) = fixture
            .send(get(
                &format!("/api/v1/auth/github/callback?state={state}"),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_provider_rejection_is_bad_gateway() {
        let fixture = Fixture::new();
        let state = issued_state(&fixture).await;
        let (status, body) = fixture
            .send(get(
                &format!("/api/v1/auth/github/callback?code=stale&state={state}"),
                None,
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "provider_error");
        assert!(fixture.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_user_declined() {
        let fixture = Fixture::new();
        let (status, _) = fixture
            .send(get(
                "/api/v1/auth/github/callback?error=access_denied&state=x",
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
