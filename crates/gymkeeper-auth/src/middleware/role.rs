//! Role authorization middleware.
//!
//! Runs after [`verify_token`](super::verify_token) and checks the attached
//! identity against a [`RoleRequirement`].
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::patch};
//! use gymkeeper_auth::middleware::{RoleRequirement, require_role, verify_token};
//! use gymkeeper_auth::policy::Operation;
//!
//! let gyms = Router::new()
//!     .route("/update/{id}", patch(update_gym))
//!     .route_layer(middleware::from_fn_with_state(
//!         RoleRequirement::operation(Operation::UpdateGym),
//!         require_role,
//!     ))
//!     .route_layer(middleware::from_fn_with_state(auth_state, verify_token));
//! ```

use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::AuthResult;
use crate::error::AuthError;
use crate::policy::{Operation, Permission, ResourceScope, can_act};
use crate::storage::Role;

use super::types::IdentityContext;

/// Path parameter holding the gym id for gym-scoped routes.
pub const DEFAULT_GYM_PARAM: &str = "id";

/// What a route requires of the caller.
#[derive(Debug, Clone, Copy)]
pub struct RoleRequirement {
    /// Required permission.
    pub permission: Permission,

    /// Name used in logs.
    pub label: &'static str,

    /// Path parameter carrying the gym id when the permission is gym-scoped.
    pub gym_param: &'static str,
}

impl RoleRequirement {
    /// Requirement for a platform operation.
    #[must_use]
    pub fn operation(operation: Operation) -> Self {
        Self {
            permission: operation.permission(),
            label: operation.as_str(),
            gym_param: DEFAULT_GYM_PARAM,
        }
    }

    /// Requirement listing roles directly.
    #[must_use]
    pub fn roles(roles: &'static [Role]) -> Self {
        Self {
            permission: Permission::roles(roles),
            label: "roles",
            gym_param: DEFAULT_GYM_PARAM,
        }
    }

    /// Reads the gym id from a different path parameter.
    #[must_use]
    pub fn gym_param(mut self, name: &'static str) -> Self {
        self.gym_param = name;
        self
    }
}

/// Middleware enforcing a [`RoleRequirement`].
///
/// Install with `axum::middleware::from_fn_with_state` as a route layer,
/// inside the verification layer.
///
/// # Errors
///
/// - `MissingCredential` if no identity is attached
/// - `RoleForbidden` if the role is not permitted
/// - `ResourceScopeForbidden` if an admin does not administer the gym
/// - `InvalidRequest` if a gym-scoped route has no numeric gym id
pub async fn require_role(
    State(requirement): State<RoleRequirement>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();

    let context = parts
        .extensions
        .get::<IdentityContext>()
        .cloned()
        .ok_or_else(|| AuthError::missing_credential("Request is not authenticated"))?;

    let scope = if requirement.permission.gym_scoped {
        gym_scope(&mut parts, requirement.gym_param).await?
    } else {
        ResourceScope::Global
    };

    if let Err(err) = can_act(context.actor(), requirement.permission, scope).into_result() {
        tracing::debug!(
            identity_id = context.id(),
            role = %context.role(),
            operation = requirement.label,
            ?scope,
            "Access denied"
        );
        return Err(err);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

async fn gym_scope(parts: &mut Parts, param: &str) -> AuthResult<ResourceScope> {
    let params = RawPathParams::from_request_parts(parts, &())
        .await
        .map_err(|e| AuthError::invalid_request(e.body_text()))?;

    let raw = params
        .iter()
        .find_map(|(key, value)| (key == param).then_some(value))
        .ok_or_else(|| AuthError::invalid_request(format!("missing path parameter '{param}'")))?;

    raw.parse::<i64>()
        .map(ResourceScope::Gym)
        .map_err(|_| AuthError::invalid_request(format!("gym id '{raw}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header::AUTHORIZATION},
        middleware,
        routing::{get, patch},
    };
    use tower::ServiceExt;

    use crate::config::TokenConfig;
    use crate::middleware::{AuthState, verify_token};
    use crate::storage::{AdminGymStorage, IdentityStorage, InMemoryIdentityStore, NewIdentity, TokenUpdate};
    use crate::token::TokenService;

    struct Fixture {
        state: AuthState,
        store: Arc<InMemoryIdentityStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryIdentityStore::new());
            let tokens = Arc::new(TokenService::new("test-secret", TokenConfig::default()));
            let state = AuthState::new(tokens, store.clone(), store.clone());
            Self { state, store }
        }

        async fn token_for(&self, external_id: &str, role: Role) -> (i64, String) {
            let identity = self
                .store
                .create(NewIdentity::new(external_id).role(role))
                .await
                .unwrap();
            let pair = self.state.tokens.issue_login_pair(identity.id).unwrap();
            self.store
                .update_tokens(identity.id, TokenUpdate::pair(&pair.access_token, &pair.refresh_token))
                .await
                .unwrap();
            (identity.id, pair.access_token)
        }

        fn router(&self) -> Router {
            Router::new()
                .route("/coach/getAll", get(|| async { "coaches" }))
                .route_layer(middleware::from_fn_with_state(
                    RoleRequirement::operation(Operation::ManageCoaches),
                    require_role,
                ))
                .merge(
                    Router::new()
                        .route("/gym/update/{id}", patch(|| async { "updated" }))
                        .route_layer(middleware::from_fn_with_state(
                            RoleRequirement::operation(Operation::UpdateGym),
                            require_role,
                        )),
                )
                .merge(
                    Router::new()
                        .route("/user/getMe", get(|| async { "me" }))
                        .route_layer(middleware::from_fn_with_state(
                            RoleRequirement::operation(Operation::ViewSelf),
                            require_role,
                        )),
                )
                .route_layer(middleware::from_fn_with_state(
                    self.state.clone(),
                    verify_token,
                ))
        }
    }

    async fn status(router: Router, method: &str, uri: &str, token: Option<&str>) -> StatusCode {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_customer_denied_admin_route() {
        let fixture = Fixture::new();
        let (_, token) = fixture.token_for("gh-c", Role::Customer).await;

        assert_eq!(
            status(fixture.router(), "GET", "/coach/getAll", Some(&token)).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(fixture.router(), "GET", "/user/getMe", Some(&token)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_admin_allowed_admin_route() {
        let fixture = Fixture::new();
        let (_, token) = fixture.token_for("gh-a", Role::Admin).await;

        assert_eq!(
            status(fixture.router(), "GET", "/coach/getAll", Some(&token)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let fixture = Fixture::new();
        assert_eq!(
            status(fixture.router(), "GET", "/coach/getAll", None).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_gym_scope() {
        let fixture = Fixture::new();
        let (admin_id, admin) = fixture.token_for("gh-a", Role::Admin).await;
        let (_, owner) = fixture.token_for("gh-o", Role::SuperAdmin).await;
        fixture.store.assign(admin_id, 7).await.unwrap();

        assert_eq!(
            status(fixture.router(), "PATCH", "/gym/update/7", Some(&admin)).await,
            StatusCode::OK
        );
        assert_eq!(
            status(fixture.router(), "PATCH", "/gym/update/9", Some(&admin)).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(fixture.router(), "PATCH", "/gym/update/7", Some(&owner)).await,
            StatusCode::OK
        );
        assert_eq!(
            status(fixture.router(), "PATCH", "/gym/update/9", Some(&owner)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_non_numeric_gym_id() {
        let fixture = Fixture::new();
        let (_, owner) = fixture.token_for("gh-o", Role::SuperAdmin).await;
        assert_eq!(
            status(fixture.router(), "PATCH", "/gym/update/seven", Some(&owner)).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_requirement_without_verification_is_unauthorized() {
        let router = Router::new()
            .route("/coach/getAll", get(|| async { "coaches" }))
            .route_layer(middleware::from_fn_with_state(
                RoleRequirement::roles(&[Role::Admin]),
                require_role,
            ));
        assert_eq!(
            status(router, "GET", "/coach/getAll", None).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
