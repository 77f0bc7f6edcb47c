use dashmap::DashMap;
use jsonwebtoken::jwk::JwkSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

/// TTL cache shared between request tasks.
///
/// Writers never block readers for long: entries are replaced wholesale and
/// expired entries are dropped when they are next looked up. Two tasks
/// refreshing the same key at once both insert, last write wins.
#[derive(Clone)]
pub struct ResponseCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Arc<DashMap<K, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<K, V> ResponseCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            default_ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let hit = self.cache.get(key).map(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.data().clone())
            }
        })?;

        if hit.is_none() {
            self.cache.remove_if(key, |_, entry| entry.is_expired());
        }
        hit
    }

    pub fn insert(&self, key: K, value: V) {
        self.cache
            .insert(key, CacheEntry::new(value, self.default_ttl));
    }

    pub fn invalidate(&self, key: &K) {
        self.cache.remove(key);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Provider signing keys, keyed by JWKS URI.
pub type JwksCache = ResponseCache<String, Arc<JwkSet>>;

impl Default for JwksCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}
