//! Role-based authorization.
//!
//! Authorization is a pure predicate over the caller and the target:
//!
//! ```ignore
//! use gymkeeper_auth::policy::{Actor, Operation, ResourceScope, can_act};
//!
//! let decision = can_act(actor, Operation::UpdateGym.permission(), ResourceScope::Gym(7));
//! if decision.is_denied() {
//!     return Err(decision.into_result().unwrap_err());
//! }
//! ```
//!
//! The [`operation`] module holds the capability table for the platform's
//! protected routes. The role middleware in [`crate::middleware`] evaluates
//! it per request.

pub mod decision;
pub mod operation;

pub use decision::{
    AccessDecision, Actor, DenyCode, DenyReason, Permission, ResourceScope, can_act,
};
pub use operation::Operation;
