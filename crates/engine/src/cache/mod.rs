//! Shared response cache
//!
//! In-process TTL+LRU cache for downstream model responses. One instance is
//! shared by every concurrent query; all operations take a single mutex, so
//! eviction decisions are serialized and the size bound holds under
//! concurrency. Keys are derived from the model identifier and the
//! whitespace-normalized prompt, so semantically identical prompts that
//! differ only in spacing share an entry.

use agora_common::config::CacheConfig;
use agora_common::metrics;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Cache observability snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses); 0.0 before any lookup
    pub hit_rate: f64,
    pub size: usize,
    pub capacity: usize,
    pub ttl_secs: u64,
}

struct CacheEntry {
    response: String,
    inserted_at: Instant,
    /// Logical recency tick; larger = more recently used
    last_used: u64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    tick: u64,
    hits: u64,
    misses: u64,
}

/// TTL+LRU response cache shared across queries
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
    ttl: Duration,
    ttl_secs: u64,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                tick: 0,
                hits: 0,
                misses: 0,
            }),
            capacity: config.capacity.max(1),
            ttl: Duration::from_secs(config.ttl_secs),
            ttl_secs: config.ttl_secs,
        }
    }

    /// Derive the cache key: sha-256 over the model identifier and the
    /// prompt with runs of whitespace collapsed to single spaces.
    pub fn key(model: &str, prompt: &str) -> String {
        let normalized = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b"\n");
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Look up a cached response. Expired entries are evicted here and
    /// counted as misses; a hit refreshes recency.
    pub fn get(&self, model: &str, prompt: &str) -> Option<String> {
        let key = Self::key(model, prompt);
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A panicked holder leaves the map in an unknown state;
                // degrade to a miss rather than propagate the panic.
                warn!("Response cache mutex poisoned, treating as miss");
                drop(poisoned);
                return None;
            }
        };

        let expired = inner
            .entries
            .get(&key)
            .map(|entry| entry.inserted_at.elapsed() >= self.ttl);

        match expired {
            Some(false) => {
                inner.tick += 1;
                let tick = inner.tick;
                let response = inner.entries.get_mut(&key).map(|entry| {
                    entry.last_used = tick;
                    entry.response.clone()
                });
                if response.is_some() {
                    inner.hits += 1;
                    metrics::record_cache(true);
                    debug!(key = %&key[..12], "Response cache hit");
                }
                response
            }
            Some(true) => {
                inner.entries.remove(&key);
                inner.misses += 1;
                metrics::record_cache(false);
                debug!(key = %&key[..12], "Response cache entry expired");
                None
            }
            None => {
                inner.misses += 1;
                metrics::record_cache(false);
                None
            }
        }
    }

    /// Insert or update a response. At capacity the least recently used
    /// entry is evicted first.
    pub fn set(&self, model: &str, prompt: &str, response: String) {
        let key = Self::key(model, prompt);
        let Ok(mut inner) = self.inner.lock() else {
            warn!("Response cache mutex poisoned, dropping insert");
            return;
        };

        inner.tick += 1;
        let tick = inner.tick;

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.response = response;
            entry.inserted_at = Instant::now();
            entry.last_used = tick;
            return;
        }

        if inner.entries.len() >= self.capacity {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                inner.entries.remove(&victim);
                metrics::record_cache_eviction();
                debug!(key = %&victim[..12], "Response cache evicted LRU entry");
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
                last_used: tick,
            },
        );
    }

    /// Drop every entry and reset the hit/miss counters
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
            inner.hits = 0;
            inner.misses = 0;
        }
    }

    pub fn stats(&self) -> CacheStats {
        let Ok(inner) = self.inner.lock() else {
            return CacheStats {
                hits: 0,
                misses: 0,
                hit_rate: 0.0,
                size: 0,
                capacity: self.capacity,
                ttl_secs: self.ttl_secs,
            };
        };
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                inner.hits as f64 / total as f64
            },
            size: inner.entries.len(),
            capacity: self.capacity,
            ttl_secs: self.ttl_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn cache(capacity: usize, ttl_secs: u64) -> ResponseCache {
        ResponseCache::new(&CacheConfig { capacity, ttl_secs })
    }

    #[test]
    fn test_set_then_get() {
        let cache = cache(10, 60);
        cache.set("gpt-x", "quelle fiscalité ?", "réponse".to_string());
        assert_eq!(
            cache.get("gpt-x", "quelle fiscalité ?"),
            Some("réponse".to_string())
        );
    }

    #[test]
    fn test_key_normalizes_whitespace() {
        assert_eq!(
            ResponseCache::key("m", "  a   b\n\tc "),
            ResponseCache::key("m", "a b c")
        );
        assert_ne!(ResponseCache::key("m1", "a"), ResponseCache::key("m2", "a"));
    }

    #[test]
    fn test_lru_evicts_oldest_at_capacity() {
        let cache = cache(3, 60);
        cache.set("m", "q1", "r1".to_string());
        cache.set("m", "q2", "r2".to_string());
        cache.set("m", "q3", "r3".to_string());
        cache.set("m", "q4", "r4".to_string());

        assert_eq!(cache.get("m", "q1"), None);
        assert_eq!(cache.get("m", "q2"), Some("r2".to_string()));
        assert_eq!(cache.get("m", "q4"), Some("r4".to_string()));
        assert_eq!(cache.stats().size, 3);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = cache(3, 60);
        cache.set("m", "q1", "r1".to_string());
        cache.set("m", "q2", "r2".to_string());
        cache.set("m", "q3", "r3".to_string());

        // Touch q1 so q2 becomes the LRU victim
        assert!(cache.get("m", "q1").is_some());
        cache.set("m", "q4", "r4".to_string());

        assert_eq!(cache.get("m", "q1"), Some("r1".to_string()));
        assert_eq!(cache.get("m", "q2"), None);
    }

    #[test]
    fn test_ttl_expiry_counts_as_miss() {
        let cache = cache(10, 0);
        cache.set("m", "q", "r".to_string());
        thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("m", "q"), None);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_update_existing_key_does_not_evict() {
        let cache = cache(2, 60);
        cache.set("m", "q1", "r1".to_string());
        cache.set("m", "q2", "r2".to_string());
        cache.set("m", "q1", "r1-bis".to_string());

        assert_eq!(cache.get("m", "q1"), Some("r1-bis".to_string()));
        assert_eq!(cache.get("m", "q2"), Some("r2".to_string()));
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = cache(10, 60);
        cache.set("m", "q", "r".to_string());
        cache.get("m", "q");
        cache.get("m", "absent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = std::sync::Arc::new(cache(100, 60));
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                let prompt = format!("q{}", i % 4);
                cache.set("m", &prompt, format!("r{i}"));
                cache.get("m", &prompt);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.stats().size <= 4);
    }
}
