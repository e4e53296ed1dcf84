//! In-memory TTL cache for idempotent reads.

use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

/// How often a write also sweeps out expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Key/value store with a per-entry expiry.
///
/// Expired entries are dropped on lookup and by a periodic sweep on write, so
/// keys that are never read again do not accumulate. Concurrent writers to the
/// same key race; the last one wins.
#[derive(Debug)]
pub struct CacheStore {
    enabled: bool,
    entries: DashMap<String, CacheEntry>,
    next_sweep: Mutex<Instant>,
}

impl CacheStore {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
            next_sweep: Mutex::new(Instant::now() + SWEEP_INTERVAL),
        }
    }

    /// Value stored under `key` if it has not expired yet.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        if !self.enabled {
            return None;
        }
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| now >= entry.expires_at);
        None
    }

    /// Store `value` for `ttl`. A no-op when disabled or when `ttl` is zero.
    pub fn put(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        if !self.enabled || ttl.is_zero() {
            return;
        }
        let now = Instant::now();
        if self.sweep_due(now) {
            let removed = self.purge_expired();
            if removed > 0 {
                tracing::debug!(
                    removed,
                    remaining = self.entries.len(),
                    "Expired cache entries swept"
                );
            }
        }
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included until purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Only one caller per interval wins the sweep.
    fn sweep_due(&self, now: Instant) -> bool {
        let mut next = self.next_sweep.lock();
        if now < *next {
            return false;
        }
        *next = now + SWEEP_INTERVAL;
        true
    }
}
