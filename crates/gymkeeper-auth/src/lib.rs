//! # gymkeeper-auth
//!
//! Authentication and authorization core of the gymkeeper platform.
//!
//! This crate provides:
//! - Signed access and refresh tokens with revocation by stored-token equality
//! - GitHub OAuth login with find-or-create of identities
//! - Axum middleware for token verification and role checks, including
//!   gym-scoped admin rights
//! - The refresh flow with full token rotation
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes, signing secret and OAuth settings
//! - [`token`] - Token issuance, verification and revocation checks
//! - [`storage`] - Storage traits for identities and admin-gym assignments
//! - [`federation`] - OAuth provider integration and the login bridge
//! - [`policy`] - Capability table and the `can_act` decision
//! - [`middleware`] - HTTP middleware for authentication/authorization
//! - [`session`] - Refresh flow
//! - [`http`] - Axum handlers for the authentication endpoints

pub mod config;
pub mod error;
pub mod federation;
pub mod http;
pub mod middleware;
pub mod policy;
pub mod session;
pub mod storage;
pub mod token;

pub use config::{AuthConfig, ConfigError, OAuthConfig, TokenConfig};
pub use error::{AuthError, ErrorCategory};
pub use federation::{GithubProvider, OAuthBridge, OAuthProvider, OAuthStateStore};
pub use http::{AuthHttpState, router};
pub use middleware::{AuthState, BearerAuth, IdentityContext, RoleRequirement};
pub use policy::{AccessDecision, Operation, Permission, ResourceScope, can_act};
pub use session::RefreshFlow;
pub use storage::{AdminGymStorage, Identity, IdentityStorage, InMemoryIdentityStore, Role};
pub use token::{TokenKind, TokenPair, TokenService};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use gymkeeper_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::federation::{ExternalProfile, GithubProvider, OAuthBridge, OAuthProvider};
    pub use crate::http::{AuthHttpState, router};
    pub use crate::middleware::{
        AuthState, BearerAuth, IdentityContext, RoleRequirement, require_role, verify_token,
    };
    pub use crate::policy::{AccessDecision, Operation, Permission, ResourceScope, can_act};
    pub use crate::session::RefreshFlow;
    pub use crate::storage::{
        AdminGymStorage, Identity, IdentityStorage, InMemoryIdentityStore, Role,
    };
    pub use crate::token::{TokenKind, TokenPair, TokenService};
}
