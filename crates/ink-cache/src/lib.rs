//! In-memory TTL cache with size-aware frequency-weighted eviction
//!
//! Bounded by both resident bytes and item count. Eviction weighs recency
//! against access frequency so a hot entry survives a burst of one-shot
//! inserts. Caching is advisory only: a cold cache never changes
//! correctness, it only costs an upstream call.

#![allow(clippy::must_use_candidate)]

mod size;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

pub use size::{EstimateSize, estimate_json_size};

/// Interval between background expiry sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on expired entries removed per opportunistic sweep
const MAX_EXPIRED_PER_SWEEP: usize = 50;

/// Number of oldest entries considered per eviction
const EVICTION_CANDIDATES: usize = 5;

struct CacheItem<T> {
    value: Arc<T>,
    expire_at: Instant,
    size: usize,
    access_count: u64,
    last_access: Instant,
}

struct Inner<T> {
    items: HashMap<String, CacheItem<T>>,
    /// Keys ordered oldest-access first
    access_order: Vec<String>,
    current_size: usize,
    total_hits: u64,
    total_misses: u64,
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Live entries
    pub size: usize,
    /// Resident bytes (estimated)
    pub memory_usage: usize,
    /// Byte budget
    pub max_size: usize,
    /// Item budget
    pub max_items: usize,
    /// Resident bytes as a percentage of the byte budget
    pub memory_usage_percent: f64,
    /// Hits as a percentage of all lookups
    pub hit_rate: f64,
    /// Total hits since creation or last clear
    pub total_hits: u64,
    /// Total misses since creation or last clear
    pub total_misses: u64,
    /// Total lookups since creation or last clear
    pub total_requests: u64,
}

/// A frequently-accessed entry, for diagnostics
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotKey {
    /// Cache key, truncated to 50 characters for display
    pub key: String,
    /// Lookups that hit this entry
    pub access_count: u64,
    /// Seconds since the entry was last read or written
    pub idle_seconds: u64,
}

/// Bounded in-memory cache with per-entry TTL
pub struct MemoryCache<T> {
    inner: Mutex<Inner<T>>,
    max_size: usize,
    max_items: usize,
    default_ttl: Duration,
}

impl<T: EstimateSize> MemoryCache<T> {
    /// Create a cache bounded by `max_size` resident bytes and `max_items`
    /// live entries, with `default_ttl` applied when `set` gives no TTL
    #[must_use]
    pub fn new(max_size: usize, max_items: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: HashMap::new(),
                access_order: Vec::new(),
                current_size: 0,
                total_hits: 0,
                total_misses: 0,
            }),
            max_size,
            max_items,
            default_ttl,
        }
    }

    /// Insert or overwrite an entry
    ///
    /// Entries larger than half the byte budget are rejected outright;
    /// returns whether the entry was stored. Expired entries are swept
    /// opportunistically (bounded per call) and old entries are evicted
    /// until both budgets hold.
    pub fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> bool {
        let size = value.estimate_size();

        if size > self.max_size / 2 {
            tracing::warn!(size, key = truncate_key(key), "cache item too large, rejected");
            return false;
        }

        let now = Instant::now();
        let expire_at = now + ttl.unwrap_or(self.default_ttl);
        let mut inner = self.lock();

        Self::clean_expired(&mut inner, now);

        // Remove the incumbent outright; the eviction loop below must
        // never select the key being overwritten
        Self::remove_entry(&mut inner, key);

        while (inner.current_size + size > self.max_size
            || inner.items.len() >= self.max_items)
            && !inner.items.is_empty()
        {
            Self::evict_one(&mut inner, now);
        }

        inner.items.insert(
            key.to_owned(),
            CacheItem {
                value: Arc::new(value),
                expire_at,
                size,
                access_count: 0,
                last_access: now,
            },
        );
        inner.current_size += size;
        Self::touch_access_order(&mut inner, key);

        true
    }

    /// Look up an entry
    ///
    /// Expired entries are removed on sight and count as misses. A hit
    /// bumps the entry's access count and recency.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let now = Instant::now();
        let mut inner = self.lock();

        let Some(item) = inner.items.get_mut(key) else {
            inner.total_misses += 1;
            return None;
        };

        if now > item.expire_at {
            Self::remove_entry(&mut inner, key);
            inner.total_misses += 1;
            return None;
        }

        item.access_count += 1;
        item.last_access = now;
        let value = Arc::clone(&item.value);
        Self::touch_access_order(&mut inner, key);
        inner.total_hits += 1;

        Some(value)
    }

    /// Remove an entry, returning whether it existed
    pub fn remove(&self, key: &str) -> bool {
        Self::remove_entry(&mut self.lock(), key)
    }

    /// Drop all entries and reset hit/miss counters
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.items.clear();
        inner.access_order.clear();
        inner.current_size = 0;
        inner.total_hits = 0;
        inner.total_misses = 0;
    }

    /// Remove expired entries (bounded per call)
    pub fn sweep_expired(&self) {
        Self::clean_expired(&mut self.lock(), Instant::now());
    }

    /// Snapshot current statistics
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total_requests = inner.total_hits + inner.total_misses;

        #[allow(clippy::cast_precision_loss)]
        CacheStats {
            size: inner.items.len(),
            memory_usage: inner.current_size,
            max_size: self.max_size,
            max_items: self.max_items,
            memory_usage_percent: (inner.current_size as f64 / self.max_size as f64) * 100.0,
            hit_rate: if total_requests > 0 {
                (inner.total_hits as f64 / total_requests as f64) * 100.0
            } else {
                0.0
            },
            total_hits: inner.total_hits,
            total_misses: inner.total_misses,
            total_requests,
        }
    }

    /// The `limit` most-accessed entries, most-accessed first
    pub fn hot_keys(&self, limit: usize) -> Vec<HotKey> {
        let inner = self.lock();
        let now = Instant::now();

        let mut keys: Vec<HotKey> = inner
            .items
            .iter()
            .map(|(key, item)| HotKey {
                key: truncate_key(key),
                access_count: item.access_count,
                idle_seconds: now.saturating_duration_since(item.last_access).as_secs(),
            })
            .collect();

        keys.sort_by(|a, b| b.access_count.cmp(&a.access_count));
        keys.truncate(limit);
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clean_expired(inner: &mut Inner<T>, now: Instant) {
        let expired: Vec<String> = inner
            .items
            .iter()
            .filter(|(_, item)| now > item.expire_at)
            .take(MAX_EXPIRED_PER_SWEEP)
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            Self::remove_entry(inner, &key);
        }
    }

    /// Evict the worst-scoring of the oldest few entries
    ///
    /// Score is idle time divided by access count, so an old but hot entry
    /// outlives a fresher entry nobody reads.
    fn evict_one(inner: &mut Inner<T>, now: Instant) {
        let Some(first) = inner.access_order.first() else {
            return;
        };

        let mut victim = first.clone();
        let mut min_score = f64::MAX;

        for key in inner.access_order.iter().take(EVICTION_CANDIDATES) {
            if let Some(item) = inner.items.get(key) {
                let idle = now.saturating_duration_since(item.last_access).as_secs_f64();
                #[allow(clippy::cast_precision_loss)]
                let score = idle / (item.access_count + 1) as f64;
                if score < min_score {
                    min_score = score;
                    victim = key.clone();
                }
            }
        }

        tracing::debug!(key = truncate_key(&victim), "evicting cache entry");
        Self::remove_entry(inner, &victim);
    }

    fn remove_entry(inner: &mut Inner<T>, key: &str) -> bool {
        let Some(item) = inner.items.remove(key) else {
            return false;
        };

        inner.current_size -= item.size;
        inner.access_order.retain(|k| k != key);
        true
    }

    fn touch_access_order(inner: &mut Inner<T>, key: &str) {
        if let Some(index) = inner.access_order.iter().position(|k| k == key) {
            inner.access_order.remove(index);
        }
        inner.access_order.push(key.to_owned());
    }
}

impl<T: EstimateSize + Send + Sync + 'static> MemoryCache<T> {
    /// Spawn a background task sweeping expired entries every
    /// [`SWEEP_INTERVAL`] until `shutdown` is cancelled
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately; skip it
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        tracing::debug!("cache sweeper stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.sweep_expired();
                    }
                }
            }
        })
    }
}

/// Compute a SHA-256 hex cache key from arbitrary input
#[must_use]
pub fn compute_cache_key(input: &str) -> String {
    let hash = Sha256::digest(input.as_bytes());
    format!("{hash:x}")
}

fn truncate_key(key: &str) -> String {
    key.chars().take(50).collect()
}
