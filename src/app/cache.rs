//! Read-through response cache for aggregate reads.
//!
//! Entries are `(payload, stored_at)` keyed by `"<resource>:<organization id>[:<qualifier>]"`.
//! An entry is served only while `now - stored_at < ttl`; an expired entry is dropped
//! by the read that observes it. Nothing sweeps entries proactively and writes never
//! invalidate, so a cached aggregate may lag the database by up to one TTL.

use std::{
    collections::HashMap,
    future::Future,
    sync::{PoisonError, RwLock},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::app::domain::OrganizationId;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Key/value cache with TTL semantics. Injected into handlers via `AppState` so
/// tests can substitute doubles and deployments can swap in a shared store.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Payload for `key` if present and younger than the TTL.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store `payload` under `key`, stamped with the current time. Last writer wins.
    async fn put(&self, key: &str, payload: Value);
}

/// Cache key for an organization-scoped resource.
pub fn org_key(resource: &str, organization_id: &OrganizationId) -> String {
    format!("{resource}:{organization_id}")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

/// Process-local cache. Growth is unbounded: keys for organizations that stop being
/// queried stay resident until read again after expiry.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl InMemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of resident entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When `key` was last written, if resident.
    pub fn stored_at(&self, key: &str) -> Option<Instant> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|e| e.stored_at)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl ResponseCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return None,
                Some(entry) if self.is_fresh(entry) => return Some(entry.payload.clone()),
                Some(_) => {}
            }
        }

        // Expired. Re-check under the write lock: a concurrent put may have refreshed it.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|e| !self.is_fresh(e)) {
            entries.remove(key);
        }
        None
    }

    async fn put(&self, key: &str, payload: Value) {
        let entry = CacheEntry {
            payload,
            stored_at: Instant::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }
}

/// Serve `key` from `cache`, or run `loader`, store its result and return it.
///
/// Concurrent misses are not coalesced: each caller runs its own loader and the
/// last `put` wins. Loader errors propagate and nothing is stored.
pub async fn read_through<T, E, F, Fut>(
    cache: &dyn ResponseCache,
    key: &str,
    loader: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(payload) = cache.get(key).await {
        match serde_json::from_value::<T>(payload) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                return Ok(value);
            }
            Err(err) => tracing::warn!(key, %err, "discarding undecodable cache entry"),
        }
    }

    tracing::debug!(key, "cache miss");
    let value = loader().await?;
    match serde_json::to_value(&value) {
        Ok(payload) => cache.put(key, payload).await,
        Err(err) => tracing::warn!(key, %err, "result not cacheable"),
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    async fn counted(calls: &AtomicUsize, value: i64) -> Result<i64, std::convert::Infallible> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn get_after_put_returns_same_payload() {
        let cache = InMemoryCache::default();
        let payload = json!({"activeSessions": 3, "lastActivityAt": "2026-01-01T00:00:00Z"});
        cache.put("active-sessions:org", payload.clone()).await;
        assert_eq!(cache.get("active-sessions:org").await, Some(payload));
        assert_eq!(cache.get("active-sessions:other").await, None);
    }

    #[tokio::test]
    async fn expired_entry_is_dropped_on_read() {
        let cache = InMemoryCache::new(Duration::from_millis(20));
        cache.put("k", json!(1)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").await, None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_never_serves() {
        let cache = InMemoryCache::new(Duration::ZERO);
        cache.put("k", json!(1)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn hit_within_ttl_skips_loader() {
        let cache = InMemoryCache::default();
        let calls = AtomicUsize::new(0);

        let first = read_through(&cache, "k", || counted(&calls, 7)).await.unwrap();
        let second = read_through(&cache, "k", || counted(&calls, 8)).await.unwrap();

        assert_eq!((first, second), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expiry_triggers_exactly_one_reload_and_restamps() {
        let cache = InMemoryCache::new(Duration::from_millis(30));
        let calls = AtomicUsize::new(0);

        read_through(&cache, "k", || counted(&calls, 1)).await.unwrap();
        let first_stamp = cache.stored_at("k").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let refreshed = read_through(&cache, "k", || counted(&calls, 2)).await.unwrap();
        let again = read_through(&cache, "k", || counted(&calls, 3)).await.unwrap();

        assert_eq!((refreshed, again), (2, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.stored_at("k").unwrap() > first_stamp);
    }

    #[tokio::test]
    async fn concurrent_misses_both_load_and_one_result_wins() {
        let cache = Arc::new(InMemoryCache::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_load = |value: i64| {
            let calls = calls.clone();
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, std::convert::Infallible>(value)
            }
        };

        let (a, b) = tokio::join!(
            read_through(cache.as_ref(), "k", slow_load(10)),
            read_through(cache.as_ref(), "k", slow_load(20)),
        );

        assert_eq!((a.unwrap(), b.unwrap()), (10, 20));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let held = cache.get("k").await.unwrap();
        assert!(held == json!(10) || held == json!(20));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn loader_error_is_not_cached() {
        let cache = InMemoryCache::default();
        let result: Result<i64, &str> = read_through(&cache, "k", || async { Err("db down") }).await;
        assert_eq!(result, Err("db down"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn undecodable_entry_counts_as_miss() {
        let cache = InMemoryCache::default();
        cache.put("k", json!("not a number")).await;
        let calls = AtomicUsize::new(0);
        let value = read_through(&cache, "k", || counted(&calls, 5)).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(cache.get("k").await, Some(json!(5)));
    }

    #[test]
    fn org_key_format() {
        let org = OrganizationId::new();
        assert_eq!(org_key("metrics", &org), format!("metrics:{org}"));
    }
}
