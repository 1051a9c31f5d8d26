//! Lean observability counters for the validating core (SPEC_FULL §A.1).
//!
//! Grounded on the teacher's `metrics/core_metrics.rs` (`Metrics` struct
//! of named `AtomicU64`/`AtomicUsize` fields, `Arc<Self>` constructor)
//! but trimmed to what this crate itself produces — no Prometheus
//! exporter or HTTP endpoint, since the network/RPC surface that would
//! serve one is out of scope here.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Process-wide counters the organizer, populator, and mempool update as
/// they run. Cheap to clone (it's an `Arc`) and safe to share across the
/// bucketed fan-out threads.
pub struct Metrics {
    pub blocks_accepted: AtomicU64,
    pub blocks_rejected: AtomicU64,
    pub reorganizations: AtomicU64,
    pub reorganization_depth_max: AtomicU64,

    pub txs_accepted: AtomicU64,
    pub txs_rejected: AtomicU64,
    pub mempool_evictions: AtomicU64,

    pub prevout_cache_hits: AtomicU64,
    pub prevout_cache_misses: AtomicU64,

    pub current_height: AtomicU64,
    pub mempool_size: AtomicUsize,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            blocks_accepted: AtomicU64::new(0),
            blocks_rejected: AtomicU64::new(0),
            reorganizations: AtomicU64::new(0),
            reorganization_depth_max: AtomicU64::new(0),
            txs_accepted: AtomicU64::new(0),
            txs_rejected: AtomicU64::new(0),
            mempool_evictions: AtomicU64::new(0),
            prevout_cache_hits: AtomicU64::new(0),
            prevout_cache_misses: AtomicU64::new(0),
            current_height: AtomicU64::new(0),
            mempool_size: AtomicUsize::new(0),
            start_time: Instant::now(),
        })
    }

    pub fn record_block_accepted(&self, height: u64) {
        self.blocks_accepted.fetch_add(1, Ordering::Relaxed);
        self.current_height.store(height, Ordering::Relaxed);
    }

    pub fn record_block_rejected(&self) {
        self.blocks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reorganization(&self, depth: u64) {
        self.reorganizations.fetch_add(1, Ordering::Relaxed);
        self.reorganization_depth_max.fetch_max(depth, Ordering::Relaxed);
    }

    pub fn record_tx_accepted(&self) {
        self.txs_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tx_rejected(&self) {
        self.txs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mempool_eviction(&self) {
        self.mempool_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prevout_cache(&self, hits: u64, misses: u64) {
        self.prevout_cache_hits.fetch_add(hits, Ordering::Relaxed);
        self.prevout_cache_misses.fetch_add(misses, Ordering::Relaxed);
    }

    pub fn set_mempool_size(&self, size: usize) {
        self.mempool_size.store(size, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// A flat `key value` snapshot, one line per counter, in the style a
    /// host binary's own exporter would scrape and relabel; this crate
    /// does not expose a scrape endpoint itself.
    pub fn snapshot_text(&self) -> String {
        format!(
            "blocks_accepted {}\nblocks_rejected {}\nreorganizations {}\nreorganization_depth_max {}\ntxs_accepted {}\ntxs_rejected {}\nmempool_evictions {}\nprevout_cache_hits {}\nprevout_cache_misses {}\ncurrent_height {}\nmempool_size {}\nuptime_secs {}\n",
            self.blocks_accepted.load(Ordering::Relaxed),
            self.blocks_rejected.load(Ordering::Relaxed),
            self.reorganizations.load(Ordering::Relaxed),
            self.reorganization_depth_max.load(Ordering::Relaxed),
            self.txs_accepted.load(Ordering::Relaxed),
            self.txs_rejected.load(Ordering::Relaxed),
            self.mempool_evictions.load(Ordering::Relaxed),
            self.prevout_cache_hits.load(Ordering::Relaxed),
            self.prevout_cache_misses.load(Ordering::Relaxed),
            self.current_height.load(Ordering::Relaxed),
            self.mempool_size.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}
