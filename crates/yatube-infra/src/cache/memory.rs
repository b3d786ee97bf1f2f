//! In-memory page cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use yatube_core::ports::{Cache, CacheError};

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() > exp)
            .unwrap_or(false)
    }
}

/// Entry cap of a cache built with [`InMemoryCache::new`].
pub const DEFAULT_MAX_ENTRIES: usize = 300;

/// Process-local cache backed by a `HashMap` behind an async `RwLock`.
/// Contents are lost on restart.
///
/// Inserting a new key into a full cache first drops expired entries, then
/// the soonest-expiring third of its capacity if that was not enough.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

fn cull(store: &mut HashMap<String, CacheEntry>, max_entries: usize) {
    store.retain(|_, entry| !entry.is_expired());
    if store.len() < max_entries {
        return;
    }

    let mut by_expiry: Vec<(Option<Instant>, String)> = store
        .iter()
        .map(|(key, entry)| (entry.expires_at, key.clone()))
        .collect();
    // Soonest to expire first; entries without a TTL last.
    by_expiry.sort_by_key(|(expires_at, _)| (expires_at.is_none(), *expires_at));

    let evict = (max_entries / 3).max(1);
    for (_, key) in by_expiry.into_iter().take(evict) {
        store.remove(&key);
    }
    tracing::debug!(evicted = evict, remaining = store.len(), "Culled page cache");
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;
        let entry = store.get(key)?;

        if entry.is_expired() {
            drop(store);
            self.store.write().await.remove(key);
            return None;
        }

        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        let mut store = self.store.write().await;
        if !store.contains_key(key) && store.len() >= self.max_entries {
            cull(&mut store, self.max_entries);
        }
        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        tracing::debug!(entries = store.len(), "Clearing page cache");
        store.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("index_page:1", "body", None).await.unwrap();
        assert_eq!(cache.get("index_page:1").await, Some("body".to_string()));
        assert!(cache.exists("index_page:1").await);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        cache.delete("key1").await.unwrap();
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let cache = InMemoryCache::new();
        cache
            .set("key1", "value1", Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_entry_count_stays_bounded() {
        let cache = InMemoryCache::with_max_entries(30);
        for i in 0..2000 {
            cache
                .set(&format!("index_page:x{i}"), "body", Some(Duration::from_secs(20)))
                .await
                .unwrap();
        }
        assert!(cache.len().await <= 30);
        assert!(cache.exists("index_page:x1999").await);
    }

    #[tokio::test]
    async fn test_full_cache_drops_expired_entries_first() {
        let cache = InMemoryCache::with_max_entries(3);
        cache
            .set("stale", "1", Some(Duration::from_millis(1)))
            .await
            .unwrap();
        cache.set("a", "2", None).await.unwrap();
        cache.set("b", "3", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        cache.set("c", "4", None).await.unwrap();
        assert_eq!(cache.len().await, 3);
        assert!(cache.exists("a").await);
        assert!(cache.exists("b").await);
        assert!(cache.exists("c").await);
    }

    #[tokio::test]
    async fn test_overwriting_a_key_in_full_cache_evicts_nothing() {
        let cache = InMemoryCache::with_max_entries(2);
        cache.set("a", "1", None).await.unwrap();
        cache.set("b", "2", None).await.unwrap();
        cache.set("a", "3", None).await.unwrap();
        assert_eq!(cache.get("a").await, Some("3".to_string()));
        assert!(cache.exists("b").await);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = InMemoryCache::new();
        cache.set("a", "1", None).await.unwrap();
        cache.set("b", "2", Some(Duration::from_secs(20))).await.unwrap();
        cache.clear().await.unwrap();
        assert!(!cache.exists("a").await);
        assert!(!cache.exists("b").await);
    }
}
