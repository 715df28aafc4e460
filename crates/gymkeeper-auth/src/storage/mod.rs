//! Storage traits for identities and admin-gym assignments.
//!
//! This module defines storage interfaces for:
//!
//! - User identities and their currently live tokens
//! - Admin-to-gym assignments
//!
//! # Implementations
//!
//! [`InMemoryIdentityStore`] implements both traits and backs the
//! development server. Persistent backends implement the same traits.

pub mod admin_gym;
pub mod identity;
pub mod memory;

pub use admin_gym::{AdminGymAssignment, AdminGymStorage};
pub use identity::{Identity, IdentityStorage, NewIdentity, Role, TokenUpdate};
pub use memory::InMemoryIdentityStore;
