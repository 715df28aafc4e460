//! External identity provider federation.
//!
//! This module provides:
//!
//! - The [`OAuthProvider`] abstraction and a GitHub implementation
//! - One-time `state` values for the authorization redirect
//! - The [`OAuthBridge`] that maps an external profile to a stored identity
//!   and issues its login tokens

pub mod bridge;
pub mod error;
pub mod github;
pub mod provider;
pub mod state;

pub use bridge::{LoginOutcome, OAuthBridge, ProvisioningAction};
pub use error::IdpError;
pub use github::GithubProvider;
pub use provider::{AuthorizationContext, ExternalProfile, OAuthProvider};
pub use state::OAuthStateStore;
