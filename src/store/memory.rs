use crate::core::cache::{CacheKey, CacheStore, CachedValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheEntry {
    value: CachedValue,
    fetched_at: Instant,
}

/// In-memory cache store using HashMap and Mutex
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl MemoryStore {
    /// Creates a new, empty MemoryStore
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey, ttl: Duration) -> Option<CachedValue> {
        let mut cache = self.inner.lock().await;
        match cache.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < ttl => {
                debug!("Cache HIT for key: {}", key);
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                debug!("Cache entry expired for key: {}", key);
                cache.remove(key);
                None
            }
            None => {
                debug!("Cache MISS for key: {}", key);
                None
            }
        }
    }

    async fn put(&self, key: CacheKey, value: CachedValue) {
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", key);
        cache.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    async fn invalidate(&self, prefix: &str) -> usize {
        let mut cache = self.inner.lock().await;
        let before = cache.len();
        cache.retain(|key, _| !key.has_prefix(prefix));
        let removed = before - cache.len();
        debug!("Cache INVALIDATE prefix '{}' removed {} entries", prefix, removed);
        removed
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }

    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
