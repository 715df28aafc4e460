//! One-time OAuth `state` values.
//!
//! The login endpoint issues a random state and embeds it in the provider
//! redirect. The callback must present it back exactly once before the TTL
//! runs out. At most `max_pending` values are held; issuing past that evicts
//! the value closest to expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;

/// In-memory store of pending OAuth state values.
#[derive(Debug)]
pub struct OAuthStateStore {
    pending: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
    max_pending: usize,
}

impl OAuthStateStore {
    /// Creates a store whose states expire after `ttl` and which holds at
    /// most `max_pending` of them (at least one).
    #[must_use]
    pub fn new(ttl: Duration, max_pending: usize) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
            max_pending: max_pending.max(1),
        }
    }

    /// Issues a fresh state value. Expired entries are pruned on the way.
    pub async fn issue(&self) -> String {
        let state = Uuid::new_v4().simple().to_string();
        let now = Instant::now();

        let mut pending = self.pending.lock().await;
        pending.retain(|_, expires_at| *expires_at > now);
        while pending.len() >= self.max_pending {
            let oldest = pending
                .iter()
                .min_by_key(|(_, expires_at)| **expires_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    pending.remove(&key);
                    tracing::debug!(max_pending = self.max_pending, "Evicted oldest OAuth state");
                }
                None => break,
            }
        }
        pending.insert(state.clone(), now + self.ttl);
        state
    }

    /// Redeems a state value. Each value is accepted at most once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` if the state is unknown, already
    /// used or expired.
    pub async fn consume(&self, state: &str) -> AuthResult<()> {
        let expires_at = self.pending.lock().await.remove(state);
        match expires_at {
            Some(expires_at) if expires_at > Instant::now() => Ok(()),
            Some(_) => Err(AuthError::invalid_request("OAuth state has expired")),
            None => Err(AuthError::invalid_request("Unknown OAuth state")),
        }
    }

    /// Number of states awaiting a callback, including expired ones not yet
    /// pruned.
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }
}
