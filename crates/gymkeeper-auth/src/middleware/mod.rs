//! HTTP middleware for authentication and authorization.
//!
//! This module provides Axum middleware for:
//!
//! - Bearer token extraction and verification
//! - Identity context injection
//! - Role and gym-scope enforcement
//! - JSON error responses
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use gymkeeper_auth::middleware::{AuthState, RoleRequirement, require_role, verify_token};
//! use gymkeeper_auth::policy::Operation;
//!
//! let app = Router::new()
//!     .route("/coach/getAll", get(list_coaches))
//!     .route_layer(middleware::from_fn_with_state(
//!         RoleRequirement::operation(Operation::ManageCoaches),
//!         require_role,
//!     ))
//!     .route_layer(middleware::from_fn_with_state(auth_state, verify_token));
//! ```

pub mod auth;
pub mod error;
pub mod role;
pub mod types;

pub use auth::{AuthState, BearerAuth, bearer_token, verify_token};
pub use role::{RoleRequirement, require_role};
pub use types::IdentityContext;
