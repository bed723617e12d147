//! Server-side token revocation
//!
//! Maps a token's `jti` to the token's own expiry. An entry is only meaningful
//! until that expiry passes, after which the signature check alone rejects the
//! token, so expired entries are dropped on lookup.

use crate::clock::Clock;
use dashmap::DashMap;
use std::sync::Arc;

pub struct RevocationList {
    entries: DashMap<String, i64>,
    clock: Arc<dyn Clock>,
}

impl RevocationList {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Revoke `jti` until `expires_at` (unix seconds). Re-revoking overwrites.
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        self.entries.insert(jti.to_string(), expires_at);
        tracing::debug!(%jti, expires_at, "Token revoked");
    }

    /// True iff `jti` is revoked and its expiry has not passed yet.
    pub fn is_revoked(&self, jti: &str) -> bool {
        let now = self.clock.now().timestamp();

        // The shard guard must be released before removing
        let expires_at = match self.entries.get(jti) {
            Some(entry) => *entry.value(),
            None => return false,
        };

        if now < expires_at {
            return true;
        }

        self.entries.remove_if(jti, |_, exp| *exp <= now);
        false
    }

    /// Drop every entry whose expiry has passed; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now().timestamp();
        let before = self.entries.len();
        self.entries.retain(|_, exp| *exp > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
