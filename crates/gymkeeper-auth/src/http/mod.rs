//! Axum handlers for the authentication endpoints.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET  | `/api/v1/auth/github/login` | [`oauth::login_handler`] |
//! | GET  | `/api/v1/auth/github/callback` | [`oauth::callback_handler`] |
//! | POST | `/api/v1/auth/refresh_token` | [`refresh::refresh_handler`] |
//! | POST | `/api/v1/auth/new_refresh_token` | [`refresh::refresh_handler`] |
//! | GET  | `/api/v1/user/getMe` | [`me::get_me_handler`] |
//! | POST | `/api/v1/superAdmin/create` | [`super_admin::create_handler`] |
//! | GET  | `/api/v1/superAdmin/getMe` | [`super_admin::get_handler`] |
//!
//! Every handler answers with `{"success": true, "message": ..., "data": ...}`
//! on success. Failures are [`AuthError`](crate::AuthError) responses.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::federation::{OAuthBridge, OAuthProvider, OAuthStateStore};
use crate::middleware::{AuthState, RoleRequirement, require_role, verify_token};
use crate::policy::Operation;
use crate::session::RefreshFlow;

pub mod me;
pub mod oauth;
pub mod refresh;
pub mod super_admin;

pub use me::{ProfileView, get_me_handler};
pub use oauth::{CallbackParams, callback_handler, login_handler};
pub use refresh::{RefreshRequest, refresh_handler};
pub use super_admin::{CreateSuperAdminRequest, create_handler, get_handler};

// =============================================================================
// State
// =============================================================================

/// State shared by the authentication endpoints.
#[derive(Clone)]
pub struct AuthHttpState {
    /// Verification state, also used by the middleware.
    pub auth: AuthState,

    /// OAuth find-or-create bridge.
    pub bridge: OAuthBridge,

    /// Refresh flow.
    pub refresh: RefreshFlow,

    /// External identity provider.
    pub provider: Arc<dyn OAuthProvider>,

    /// Pending OAuth `state` values.
    pub oauth_states: Arc<OAuthStateStore>,
}

impl AuthHttpState {
    /// Wires the bridge and refresh flow to the stores held by `auth`.
    pub fn new(
        auth: AuthState,
        provider: Arc<dyn OAuthProvider>,
        oauth_states: OAuthStateStore,
    ) -> Self {
        Self {
            bridge: OAuthBridge::new(auth.identities.clone(), auth.tokens.clone()),
            refresh: RefreshFlow::new(auth.identities.clone(), auth.tokens.clone()),
            auth,
            provider,
            oauth_states: Arc::new(oauth_states),
        }
    }
}

impl FromRef<AuthHttpState> for AuthState {
    fn from_ref(state: &AuthHttpState) -> Self {
        state.auth.clone()
    }
}

// =============================================================================
// Router
// =============================================================================

/// Builds the router for all authentication endpoints.
pub fn router(state: AuthHttpState) -> Router {
    let public = Router::new()
        .route("/api/v1/auth/github/login", get(login_handler))
        .route("/api/v1/auth/github/callback", get(callback_handler))
        .route("/api/v1/auth/refresh_token", post(refresh_handler))
        .route("/api/v1/auth/new_refresh_token", post(refresh_handler))
        .route("/api/v1/superAdmin/create", post(create_handler))
        .route("/api/v1/superAdmin/getMe", get(get_handler));

    let verified = Router::new()
        .route("/api/v1/user/getMe", get(get_me_handler))
        .route_layer(middleware::from_fn_with_state(
            RoleRequirement::operation(Operation::ViewSelf),
            require_role,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            verify_token,
        ));

    public.merge(verified).with_state(state)
}

// =============================================================================
// Response envelope
// =============================================================================

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: &'static str,
    /// Payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps `data` in a success envelope.
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }

    /// Responds with `status` and this envelope as the JSON body.
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}

// =============================================================================
// Test support
// =============================================================================
