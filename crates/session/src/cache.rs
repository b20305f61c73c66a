//! Short-TTL memoization of resolved session/organization state.
//!
//! Dependency-injected rather than a module-level singleton, so staleness
//! and cross-user invalidation are directly testable. Reads and writes move
//! whole snapshots; a torn `(user_id, cached_at)` pair is never observable.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use mostrador_core::{AuthUserId, Organization};

/// Staleness policy. 5 minutes unless configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
        }
    }
}

/// One memoized resolution result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionSnapshot {
    pub user_id: AuthUserId,
    pub is_super_admin: bool,
    pub organization: Option<Organization>,
    pub cached_at: DateTime<Utc>,
}

/// Process-wide resolution cache (one entry: the current identity).
///
/// `now` is a parameter everywhere so expiry is deterministic under test.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    policy: CachePolicy,
    inner: RwLock<Option<ResolutionSnapshot>>,
}

impl ResolutionCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(None),
        }
    }

    /// The snapshot for `user_id`, unless absent, owned by another user, or
    /// older than the TTL.
    pub fn get(&self, user_id: AuthUserId, now: DateTime<Utc>) -> Option<ResolutionSnapshot> {
        let Ok(guard) = self.inner.read() else {
            return None;
        };
        let snapshot = guard.as_ref()?;
        if snapshot.user_id != user_id {
            return None;
        }
        if now.signed_duration_since(snapshot.cached_at) > self.policy.ttl {
            debug!(%user_id, "resolution cache entry expired");
            return None;
        }
        Some(snapshot.clone())
    }

    /// Replace the cached snapshot wholesale.
    pub fn put(&self, snapshot: ResolutionSnapshot) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(snapshot);
        }
    }

    /// Drop the entry if it belongs to `user_id`.
    pub fn invalidate_user(&self, user_id: AuthUserId) {
        if let Ok(mut guard) = self.inner.write() {
            if guard.as_ref().is_some_and(|s| s.user_id == user_id) {
                debug!(%user_id, "invalidating resolution cache");
                *guard = None;
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(user_id: AuthUserId, cached_at: DateTime<Utc>) -> ResolutionSnapshot {
        ResolutionSnapshot {
            user_id,
            is_super_admin: false,
            organization: None,
            cached_at,
        }
    }

    #[test]
    fn hit_within_ttl_miss_after() {
        let cache = ResolutionCache::new(CachePolicy {
            ttl: Duration::minutes(5),
        });
        let user = AuthUserId::new();
        let t0 = Utc::now();
        cache.put(snapshot(user, t0));

        assert!(cache.get(user, t0 + Duration::minutes(4)).is_some());
        assert!(cache.get(user, t0 + Duration::minutes(6)).is_none());
    }

    #[test]
    fn never_serves_another_users_entry() {
        let cache = ResolutionCache::new(CachePolicy::default());
        let first = AuthUserId::new();
        let second = AuthUserId::new();
        let now = Utc::now();
        cache.put(snapshot(first, now));

        assert!(cache.get(second, now).is_none());
    }

    #[test]
    fn invalidate_user_only_drops_that_users_entry() {
        let cache = ResolutionCache::new(CachePolicy::default());
        let owner = AuthUserId::new();
        let other = AuthUserId::new();
        let now = Utc::now();
        cache.put(snapshot(owner, now));

        cache.invalidate_user(other);
        assert!(cache.get(owner, now).is_some());

        cache.invalidate_user(owner);
        assert!(cache.get(owner, now).is_none());
    }

    #[test]
    fn put_replaces_the_whole_snapshot() {
        let cache = ResolutionCache::new(CachePolicy::default());
        let first = AuthUserId::new();
        let second = AuthUserId::new();
        let now = Utc::now();

        cache.put(snapshot(first, now));
        cache.put(snapshot(second, now));

        assert!(cache.get(first, now).is_none());
        assert!(cache.get(second, now).is_some());
    }
}
