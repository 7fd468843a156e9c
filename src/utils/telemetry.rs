//! Scan Telemetry
//!
//! In-process counters for monitoring: scans, honeypots found, cache
//! efficiency, errors, latency. Atomic counters only; nothing about the
//! scanned addresses is kept.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Lock-free scan counters
#[derive(Debug)]
pub struct ScanTelemetry {
    total_scans: AtomicU64,
    code_scans: AtomicU64,
    honeypots_detected: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    errors: AtomicU64,
    total_latency_ms: AtomicU64,
    started_at: Instant,
}

impl Default for ScanTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanTelemetry {
    pub fn new() -> Self {
        Self {
            total_scans: AtomicU64::new(0),
            code_scans: AtomicU64::new(0),
            honeypots_detected: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Record a completed address scan
    pub fn record_scan(&self, is_honeypot: bool, latency_ms: u64) {
        self.total_scans.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        if is_honeypot {
            self.honeypots_detected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed pasted-code scan
    pub fn record_code_scan(&self, is_honeypot: bool) {
        self.code_scans.fetch_add(1, Ordering::Relaxed);
        if is_honeypot {
            self.honeypots_detected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ScanStats {
        let total_scans = self.total_scans.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        let avg_latency_ms = if total_scans > 0 {
            total_latency as f64 / total_scans as f64
        } else {
            0.0
        };

        ScanStats {
            total_scans,
            code_scans: self.code_scans.load(Ordering::Relaxed),
            honeypots_detected: self.honeypots_detected.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            avg_latency_ms,
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }
}

/// Snapshot of the counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub total_scans: u64,
    pub code_scans: u64,
    pub honeypots_detected: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub errors: u64,
    pub avg_latency_ms: f64,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let telemetry = ScanTelemetry::new();
        telemetry.record_scan(true, 100);
        telemetry.record_scan(false, 50);
        telemetry.record_code_scan(true);
        telemetry.record_cache_hit();
        telemetry.record_cache_miss();
        telemetry.record_error();

        let stats = telemetry.get_stats();
        assert_eq!(stats.total_scans, 2);
        assert_eq!(stats.code_scans, 1);
        assert_eq!(stats.honeypots_detected, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.errors, 1);
        assert!((stats.avg_latency_ms - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats() {
        let stats = ScanTelemetry::default().get_stats();
        assert_eq!(stats.total_scans, 0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }
}
