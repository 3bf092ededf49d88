//! Opt-in TTL cache in front of a [`RemoteResolver`].
//!
//! Without a TTL every validation of a foreign token performs a fresh lookup.
//! With one, successful lookups are reused until they expire. Failures are
//! never cached.

use crate::{FederationError, PublishedNode, RemoteResolver};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Default upper bound on cached entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

type CacheKey = (String, String);

/// Wraps a resolver with a per-`(domain, node)` cache.
///
/// A `None` TTL disables caching entirely and every call goes to the inner
/// resolver. The map never holds more than `max_entries`; when full, expired
/// entries are dropped first and then the oldest one.
#[derive(Debug, Clone)]
pub struct CachedResolver<R> {
    inner: R,
    ttl: Option<Duration>,
    max_entries: usize,
    entries: Arc<RwLock<HashMap<CacheKey, (PublishedNode, Instant)>>>,
}

impl<R> CachedResolver<R> {
    pub fn new(inner: R, ttl: Option<Duration>) -> Self {
        Self::with_max_entries(inner, ttl, DEFAULT_MAX_ENTRIES)
    }

    /// Like [`CachedResolver::new`] with an explicit entry bound.
    ///
    /// A bound of zero disables caching.
    pub fn with_max_entries(inner: R, ttl: Option<Duration>, max_entries: usize) -> Self {
        Self {
            inner,
            ttl,
            max_entries,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    fn cached(&self, domain: &str, node: &str) -> Option<PublishedNode> {
        let ttl = self.ttl?;
        let entries = self.entries.read().ok()?;
        let (published, stored_at) = entries.get(&(domain.to_string(), node.to_string()))?;
        if stored_at.elapsed() < ttl {
            Some(published.clone())
        } else {
            None
        }
    }

    fn store(&self, domain: &str, node: &str, published: &PublishedNode) {
        let Some(ttl) = self.ttl else {
            return;
        };
        if self.max_entries == 0 {
            return;
        }
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("federation cache lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };

        let key = (domain.to_string(), node.to_string());
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            entries.retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, (_, stored_at))| *stored_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(key, (published.clone(), Instant::now()));
    }
}

impl<R: RemoteResolver> RemoteResolver for CachedResolver<R> {
    async fn resolve_remote(
        &self,
        domain: &str,
        node: &str,
    ) -> Result<PublishedNode, FederationError> {
        if let Some(published) = self.cached(domain, node) {
            tracing::debug!(domain, node, "federation cache hit");
            return Ok(published);
        }

        let published = self.inner.resolve_remote(domain, node).await?;
        self.store(domain, node, &published);
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
        fail: bool,
    }

    impl RemoteResolver for CountingResolver {
        async fn resolve_remote(
            &self,
            domain: &str,
            node: &str,
        ) -> Result<PublishedNode, FederationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FederationError::Status(503));
            }
            Ok(PublishedNode {
                identifier: node.to_string(),
                display_name: domain.to_string(),
                signing_public_key: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn disabled_cache_always_resolves() {
        let cache = CachedResolver::new(CountingResolver::default(), None);
        cache.resolve_remote("d1", "alpha").await.unwrap();
        cache.resolve_remote("d1", "alpha").await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn enabled_cache_reuses_fresh_entries() {
        let cache =
            CachedResolver::new(CountingResolver::default(), Some(Duration::from_secs(60)));
        let first = cache.resolve_remote("d1", "alpha").await.unwrap();
        let second = cache.resolve_remote("d1", "alpha").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);

        cache.resolve_remote("d2", "alpha").await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let cache = CachedResolver::new(
            CountingResolver::default(),
            Some(Duration::from_millis(20)),
        );
        cache.resolve_remote("d1", "alpha").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.resolve_remote("d1", "alpha").await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = CachedResolver::new(
            CountingResolver {
                fail: true,
                ..Default::default()
            },
            Some(Duration::from_secs(60)),
        );
        assert!(cache.resolve_remote("d1", "alpha").await.is_err());
        assert!(cache.resolve_remote("d1", "alpha").await.is_err());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let cache =
            CachedResolver::new(CountingResolver::default(), Some(Duration::from_secs(60)));
        cache.resolve_remote("d1", "alpha").await.unwrap();
        cache.clear();
        cache.resolve_remote("d1", "alpha").await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fresh_entries_stay_within_bound() {
        let cache = CachedResolver::with_max_entries(
            CountingResolver::default(),
            Some(Duration::from_secs(3600)),
            100,
        );
        for i in 0..250 {
            cache
                .resolve_remote("evil.example", &format!("n{i}"))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 100);

        // The newest entry is still served from the cache.
        cache.resolve_remote("evil.example", "n249").await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 250);
    }

    #[tokio::test]
    async fn default_bound_applies_to_new() {
        let cache =
            CachedResolver::new(CountingResolver::default(), Some(Duration::from_secs(3600)));
        for i in 0..DEFAULT_MAX_ENTRIES + 50 {
            cache
                .resolve_remote("evil.example", &format!("n{i}"))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), DEFAULT_MAX_ENTRIES);
    }

    #[tokio::test]
    async fn zero_bound_disables_caching() {
        let cache = CachedResolver::with_max_entries(
            CountingResolver::default(),
            Some(Duration::from_secs(60)),
            0,
        );
        cache.resolve_remote("d1", "alpha").await.unwrap();
        cache.resolve_remote("d1", "alpha").await.unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }
}
