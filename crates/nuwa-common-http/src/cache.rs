//! Bounded in-memory response cache with lazy TTL expiry.

use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EvictionCause {
    /// Read after its TTL elapsed.
    Expired,
    /// Pushed out as least recently used.
    Capacity,
    /// Removed by [`MemoryCache::clear`].
    Cleared,
}

/// Callback invoked after an entry is evicted.
pub type EvictionListener = Arc<dyn Fn(&str, EvictionCause) + Send + Sync>;

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit ratio in `[0, 1]`, zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    evictions: AtomicU64,
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

/// LRU cache keyed by request fingerprint.
///
/// Entries expire lazily: a read past the TTL removes the entry and misses.
/// There is no background sweep. Listeners run after the lock is released.
pub struct MemoryCache<V> {
    entries: Mutex<LruCache<String, Entry<V>>>,
    default_ttl: Duration,
    capacity: NonZeroUsize,
    counters: Counters,
    listener: Option<EvictionListener>,
}

impl<V: Clone> MemoryCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum one).
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
            capacity,
            counters: Counters::default(),
            listener: None,
        }
    }

    /// Attach an eviction listener.
    pub fn with_listener(mut self, listener: EvictionListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Store a value, replacing any existing entry for `key`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let entry = Entry {
            value,
            stored_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };

        let evicted = {
            let mut entries = self.entries.lock();
            match entries.push(key.clone(), entry) {
                Some((old_key, _)) if old_key != key => Some(old_key),
                _ => None,
            }
        };
        self.counters.stores.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, "cache store");

        if let Some(old_key) = evicted {
            self.notify(&old_key, EvictionCause::Capacity);
        }
    }

    /// Fresh value for `key`. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let outcome = {
            let mut entries = self.entries.lock();
            let fresh = entries
                .get(key)
                .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));
            match fresh {
                Some(Some(value)) => Ok(value),
                Some(None) => {
                    entries.pop(key);
                    Err(true)
                }
                None => Err(false),
            }
        };

        match outcome {
            Ok(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Err(expired) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                if expired {
                    self.notify(key, EvictionCause::Expired);
                }
                None
            }
        }
    }

    /// Remove an entry without notifying the listener.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.lock().pop(key).map(|e| e.value)
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let keys: Vec<String> = {
            let mut entries = self.entries.lock();
            let keys = entries.iter().map(|(k, _)| k.clone()).collect();
            entries.clear();
            keys
        };
        for key in &keys {
            self.notify(key, EvictionCause::Cleared);
        }
        keys.len()
    }

    /// Number of stored entries, including ones not yet found expired.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Default entry lifetime.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            stores: self.counters.stores.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    fn notify(&self, key: &str, cause: EvictionCause) {
        self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, ?cause, "cache eviction");
        if let Some(listener) = &self.listener {
            listener(key, cause);
        }
    }
}

impl<V> fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn recording() -> (EvictionListener, Arc<StdMutex<Vec<(String, EvictionCause)>>>) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let listener: EvictionListener = Arc::new(move |key: &str, cause| {
            sink.lock().unwrap().push((key.to_string(), cause));
        });
        (listener, log)
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_set() {
        let cache = MemoryCache::new(8, Duration::from_secs(60));
        cache.set("k", 1, None);
        assert_eq!(cache.get("k"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite() {
        let cache = MemoryCache::new(8, Duration::from_secs(60));
        cache.set("k", "v1", None);
        cache.set("k", "v2", None);
        assert_eq!(cache.get("k"), Some("v2"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_removed_on_read() {
        let (listener, log) = recording();
        let cache = MemoryCache::new(8, Duration::from_secs(300)).with_listener(listener);
        cache.set("k", 1, Some(Duration::from_millis(100)));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("k"), Some(1), "an entry exactly at its TTL is still fresh");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());

        assert_eq!(*log.lock().unwrap(), vec![("k".to_string(), EvictionCause::Expired)]);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.evictions), (1, 2, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_background_expiry() {
        let cache = MemoryCache::new(8, Duration::from_millis(10));
        cache.set("k", 1, None);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_least_recently_used() {
        let (listener, log) = recording();
        let cache = MemoryCache::new(2, Duration::from_secs(60)).with_listener(listener);

        cache.set("a", 1, None);
        cache.set("b", 2, None);
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3, None);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(*log.lock().unwrap(), vec![("b".to_string(), EvictionCause::Capacity)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_reports_every_key() {
        let (listener, log) = recording();
        let cache = MemoryCache::new(8, Duration::from_secs(60)).with_listener(listener);
        cache.set("a", 1, None);
        cache.set("b", 2, None);

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());

        let mut causes = log.lock().unwrap().clone();
        causes.sort();
        assert_eq!(
            causes,
            vec![
                ("a".to_string(), EvictionCause::Cleared),
                ("b".to_string(), EvictionCause::Cleared)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_is_silent() {
        let (listener, log) = recording();
        let cache = MemoryCache::new(8, Duration::from_secs(60)).with_listener(listener);
        cache.set("a", 1, None);
        assert_eq!(cache.remove("a"), Some(1));
        assert_eq!(cache.remove("a"), None);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache: MemoryCache<u8> = MemoryCache::new(0, Duration::from_secs(1));
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }
}
