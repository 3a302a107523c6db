use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::Role;

/// Identity recovered from a verified token, remembered until the token expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedIdentity {
    pub user_id: i64,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Concurrent memo of token verifications, keyed by the raw bearer string.
///
/// Entries are evicted lazily on read once expired, and in bulk by
/// [`TokenCache::sweep_expired`], which the server runs on an interval.
#[derive(Debug)]
pub struct TokenCache {
    entries: DashMap<String, CachedIdentity>,
    max_entries: usize,
}

impl TokenCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }

    /// Insert or overwrite the entry for `token`.
    ///
    /// When the cache is full, expired entries are swept first; if it is still
    /// full the entry is simply not cached and the next request re-verifies.
    pub fn put(&self, token: &str, user_id: i64, role: Role, expires_at: DateTime<Utc>) {
        if !self.entries.contains_key(token) && self.entries.len() >= self.max_entries {
            self.sweep_expired();
            if self.entries.len() >= self.max_entries {
                debug!("token cache full ({} entries), skipping insert", self.max_entries);
                return;
            }
        }

        self.entries.insert(
            token.to_string(),
            CachedIdentity {
                user_id,
                role,
                expires_at,
            },
        );
    }

    pub fn get(&self, token: &str) -> Option<CachedIdentity> {
        self.get_at(token, Utc::now())
    }

    /// Lookup against an explicit clock. Expired entries are removed and reported as a miss.
    pub fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<CachedIdentity> {
        let identity = *self.entries.get(token)?;
        if now > identity.expires_at {
            // The shard guard from `get` is already released here, so removal cannot deadlock.
            self.entries
                .remove_if(token, |_, cached| now > cached.expires_at);
            return None;
        }
        Some(identity)
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| now <= cached.expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
