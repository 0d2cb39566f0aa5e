use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed values that go stale after a per-entry time to live.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now()).await
    }

    pub async fn insert(&self, key: String, value: V, ttl: Duration) {
        self.insert_at(key, value, ttl, Instant::now()).await
    }

    pub(crate) async fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| now <= entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    pub(crate) async fn insert_at(&self, key: String, value: V, ttl: Duration, now: Instant) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| now <= entry.expires_at);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
