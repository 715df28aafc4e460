//! Token issuance, verification and revocation.
//!
//! This module provides:
//!
//! - HS256 JWT encoding and decoding
//! - Access and refresh token issuance with configurable lifetimes
//! - Revocation by comparison against the stored token

pub mod jwt;
pub mod revocation;
pub mod service;

pub use jwt::{JwtError, JwtService, TokenClaims, TokenKind};
pub use revocation::{StoredTokenEquality, TokenRevocationCheck};
pub use service::{TokenPair, TokenService, TokenTier, VerifiedToken};
