//! Token revocation by stored-token equality.
//!
//! gymkeeper keeps no revocation list. The identity record stores the most
//! recently issued access and refresh token, and a presented token is live
//! only while it matches what is stored. Issuing a new pair overwrites the
//! stored values, which revokes everything issued before.
//!
//! The check sits behind [`TokenRevocationCheck`] so a deployment can swap in
//! a different mechanism (e.g. a `jti` deny-list) without touching the
//! verification middleware.

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::Identity;
use crate::token::jwt::TokenKind;

/// Decides whether a cryptographically valid token is still live.
pub trait TokenRevocationCheck: Send + Sync {
    /// Returns `Ok(())` if `presented` is still live for `identity`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SupersededCredential` if the token was replaced.
    fn ensure_live(&self, identity: &Identity, kind: TokenKind, presented: &str) -> AuthResult<()>;
}

/// Compares the presented token with the one stored on the identity.
///
/// Access tokens are accepted when nothing is stored yet, so an identity that
/// was created but never received tokens still verifies. Refresh tokens must
/// always match the stored value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredTokenEquality;

impl TokenRevocationCheck for StoredTokenEquality {
    fn ensure_live(&self, identity: &Identity, kind: TokenKind, presented: &str) -> AuthResult<()> {
        let live = match kind {
            TokenKind::Access => identity
                .live_access_token()
                .is_none_or(|stored| stored == presented),
            TokenKind::Refresh => identity.live_refresh_token() == Some(presented),
        };

        if live {
            Ok(())
        } else {
            tracing::debug!(identity_id = identity.id, kind = %kind, "token superseded");
            Err(AuthError::superseded_credential(format!(
                "{kind} token has been superseded by a newer one"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Role;
    use time::OffsetDateTime;

    fn identity(access: Option<&str>, refresh: Option<&str>) -> Identity {
        let now = OffsetDateTime::now_utc();
        Identity {
            id: 1,
            external_id: "gh-1".to_string(),
            username: None,
            email: None,
            first_name: None,
            last_name: None,
            role: Role::Customer,
            current_access_token: access.map(str::to_string),
            current_refresh_token: refresh.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_matching_access_token_is_live() {
        let check = StoredTokenEquality;
        assert!(check
            .ensure_live(&identity(Some("a1"), None), TokenKind::Access, "a1")
            .is_ok());
    }

    #[test]
    fn test_replaced_access_token_is_superseded() {
        let check = StoredTokenEquality;
        let err = check
            .ensure_live(&identity(Some("a2"), None), TokenKind::Access, "a1")
            .unwrap_err();
        assert!(matches!(err, AuthError::SupersededCredential { .. }));
    }

    #[test]
    fn test_empty_stored_access_token_skips_check() {
        let check = StoredTokenEquality;
        assert!(check
            .ensure_live(&identity(None, None), TokenKind::Access, "a1")
            .is_ok());
        assert!(check
            .ensure_live(&identity(Some(""), None), TokenKind::Access, "a1")
            .is_ok());
    }

    #[test]
    fn test_refresh_token_must_be_stored() {
        let check = StoredTokenEquality;
        assert!(check
            .ensure_live(&identity(None, Some("r1")), TokenKind::Refresh, "r1")
            .is_ok());
        assert!(check
            .ensure_live(&identity(None, None), TokenKind::Refresh, "r1")
            .is_err());
        assert!(check
            .ensure_live(&identity(None, Some("r2")), TokenKind::Refresh, "r1")
            .is_err());
    }
}
