//! Mining statistics shared across workers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters tracking pool-wide mining progress.
pub struct MiningStats {
    hashes_computed: AtomicU64,
    blocks_committed: AtomicU64,
    rounds_rejected: AtomicU64,
    start_time: Instant,
}

impl MiningStats {
    pub fn new() -> Self {
        Self {
            hashes_computed: AtomicU64::new(0),
            blocks_committed: AtomicU64::new(0),
            rounds_rejected: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_hashes(&self, count: u64) {
        self.hashes_computed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.blocks_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rounds_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hashes_computed(&self) -> u64 {
        self.hashes_computed.load(Ordering::Relaxed)
    }

    pub fn blocks_committed(&self) -> u64 {
        self.blocks_committed.load(Ordering::Relaxed)
    }

    pub fn rounds_rejected(&self) -> u64 {
        self.rounds_rejected.load(Ordering::Relaxed)
    }

    /// Average hashes per second since the pool started.
    pub fn hashrate(&self) -> f64 {
        let hashes = self.hashes_computed() as f64;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 { hashes / elapsed } else { 0.0 }
    }
}

impl Default for MiningStats {
    fn default() -> Self {
        Self::new()
    }
}
