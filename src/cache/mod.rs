
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Deterministic hash over an endpoint identity and its request parameters,
/// used as the cache key.
///
/// `serde_json` maps are BTreeMap-backed, so serialization is key-ordered and
/// identical bodies with differently ordered fields hash identically.
#[inline]
pub fn fingerprint(endpoint: &str, params: &Value) -> String {
    let canonical = format!("{}:{}", endpoint, params);
    let digest = Sha256::digest(canonical.as_bytes());

    let mut key = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(key, "{:02x}", byte);
    }
    key
}

struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // Front is least recently used.
    order: VecDeque<String>,
}

/// Capacity-bounded LRU cache with per-entry TTL.
///
/// Expiry is lazy: an entry older than the TTL is purged on access and
/// reported absent. The expiry check and the promote-on-hit share one
/// critical section. Eligibility is the caller's concern; this type caches
/// whatever it is given.
pub struct ResponseCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl ResponseCache {
    #[inline]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
            None => return None,
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }

        // Promote to most recently used.
        inner.order.retain(|k| k != key);
        inner.order.push_back(key.to_string());

        inner.entries.get(key).map(|entry| entry.payload.clone())
    }

    #[inline]
    pub fn put(&self, key: &str, payload: Value) {
        let mut inner = self.lock();

        if inner.entries.contains_key(key) {
            inner.order.retain(|k| k != key);
        } else if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                debug!("Cache at capacity, evicting: {}", oldest);
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push_back(key.to_string());
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    #[inline]
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
        debug!("Response cache cleared");
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
