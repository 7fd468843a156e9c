//! Verdict Cache
//!
//! In-memory TTL cache for address scan results, backed by DashMap.
//!
//! Features:
//! - key = `<detectionVersion>:<chain>:<lowercased address>`, so bumping
//!   the detection version invalidates every older verdict
//! - TTL expiry checked on read, plus periodic sweep
//! - hit/miss counters
//!
//! No locking beyond DashMap's shards: two concurrent scans of the same
//! address both write, last write wins. Verdicts for the same key are
//! identical, so this converges.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::models::config::{CacheConfig, Chain};
use crate::models::types::ScanResult;
use crate::utils::constants::DETECTION_VERSION;

/// Cache entry with its insertion time
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub result: ScanResult,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        self.ttl.saturating_sub(self.created_at.elapsed()).as_secs()
    }
}

/// Shared verdict cache
#[derive(Clone)]
pub struct VerdictCache {
    store: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new(CacheConfig::default().ttl)
    }
}

impl VerdictCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `<detectionVersion>:<chain>:<lowercased address>`
    pub fn cache_key(chain: Chain, address: &str) -> String {
        format!("{}:{}:{}", DETECTION_VERSION, chain.name(), address.to_lowercase())
    }

    /// Unexpired result for `chain`/`address`, if any
    pub fn get(&self, chain: Chain, address: &str) -> Option<ScanResult> {
        let key = Self::cache_key(chain, address);

        if let Some(entry) = self.store.get(&key) {
            if entry.is_expired() {
                drop(entry); // release shard read lock before remove
                self.store.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                info!("✅ CACHE HIT: {} (TTL: {}s remaining)", key, entry.remaining_ttl());
                Some(entry.result.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}", key);
            None
        }
    }

    /// Store a fresh result. The `cached` marker is never stored.
    pub fn set(&self, chain: Chain, address: &str, result: &ScanResult) {
        let key = Self::cache_key(chain, address);
        let mut result = result.clone();
        result.cached = false;

        self.store.insert(
            key.clone(),
            CacheEntry {
                result,
                created_at: Instant::now(),
                ttl: self.ttl,
            },
        );
        debug!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl.as_secs());
    }

    /// Drop expired entries; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
