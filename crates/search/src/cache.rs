use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::time::Instant;

/// How often a full sweep of expired entries piggybacks on a get/set.
const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Point-in-time cache counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub last_cleanup: SystemTime,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    last_sweep: Instant,
    last_sweep_wall: SystemTime,
}

impl<V> CacheInner<V> {
    fn maybe_sweep(&mut self) {
        if Instant::now().duration_since(self.last_sweep) > SWEEP_INTERVAL {
            self.sweep();
        }
    }

    fn sweep(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.expires_at);
        let removed = before - self.entries.len();
        self.last_sweep = now;
        self.last_sweep_wall = SystemTime::now();
        if removed > 0 {
            log::info!("Swept {removed} expired cache entries");
        }
        removed
    }
}

/// In-memory TTL cache for computed results.
///
/// Entries expire strictly after their deadline. Expired entries are
/// dropped lazily: on direct access, and in a full sweep at most once
/// per [`SWEEP_INTERVAL`] as a side effect of normal gets and sets.
pub struct ResultCache<V> {
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> ResultCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                last_sweep: Instant::now(),
                last_sweep_wall: SystemTime::now(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner<V>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Look up `key`, counting a hit or miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.lock();
        guard.maybe_sweep();
        let inner = &mut *guard;

        let now = Instant::now();
        match inner.entries.get(key) {
            Some(entry) if now <= entry.expires_at => {
                let value = entry.value.clone();
                inner.hits += 1;
                Some(value)
            }
            Some(_) => {
                inner.entries.remove(key);
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl`, replacing any prior entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut guard = self.lock();
        guard.maybe_sweep();
        guard.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Drop every entry whose key contains `pattern` as a substring.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut guard = self.lock();
        let before = guard.entries.len();
        guard.entries.retain(|key, _| !key.contains(pattern));
        let removed = before - guard.entries.len();
        if removed > 0 {
            log::debug!("Invalidated {removed} cache entries matching '{pattern}'");
        }
        removed
    }

    /// Drop all entries. Hit/miss counters are preserved.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Remove every expired entry now. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        self.lock().sweep()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            inner.hits as f64 / total as f64
        };
        CacheStats {
            size: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            last_cleanup: inner.last_sweep_wall,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
