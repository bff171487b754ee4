//! Nonce partitioning strategies.
//!
//! Within one round, no two workers may ever test the same nonce. Two
//! strategies provide that guarantee:
//!
//! - [`SharedCounter`]: every claim is a `fetch_add` on one shared counter.
//! - [`Striped`]: the nonce space `[0, u64::MAX)` is divided into one
//!   contiguous stripe per worker; each worker advances its own cursor with
//!   no cross-worker coordination after setup.
//!
//! Both reset at the start of every round. A stripe never wraps into its
//! neighbour within a round's lifetime: exhausting a stripe would require
//! more hash attempts than a round can physically run.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use placer_core::config::PartitionStrategy;

/// Hands out round-unique nonces to workers.
pub trait NonceSource: Send + Sync {
    /// Claim the next untested nonce for `worker`.
    fn next_nonce(&self, worker: usize) -> u64;

    /// Re-partition the nonce space for a new round.
    fn reset(&self);
}

/// A single mutually-exclusive counter claimed by every worker.
pub struct SharedCounter {
    next: AtomicU64,
}

impl SharedCounter {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(0) }
    }
}

impl Default for SharedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceSource for SharedCounter {
    fn next_nonce(&self, _worker: usize) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

/// Disjoint contiguous stripes, one per worker.
pub struct Striped {
    cursors: Vec<AtomicU64>,
    stride: u64,
}

impl Striped {
    /// Partition the nonce space into `workers` equal stripes.
    pub fn new(workers: usize) -> Self {
        debug_assert!(workers > 0, "stripe count validated at config time");
        let stride = u64::MAX / workers as u64;
        let cursors = (0..workers as u64)
            .map(|w| AtomicU64::new(w * stride))
            .collect();
        Self { cursors, stride }
    }

    fn stripe_base(&self, worker: usize) -> u64 {
        worker as u64 * self.stride
    }
}

impl NonceSource for Striped {
    fn next_nonce(&self, worker: usize) -> u64 {
        self.cursors[worker].fetch_add(1, Ordering::Relaxed)
    }

    fn reset(&self) {
        for (worker, cursor) in self.cursors.iter().enumerate() {
            cursor.store(self.stripe_base(worker), Ordering::Relaxed);
        }
    }
}

/// Build the configured nonce source for a pool of `workers`.
pub fn make_source(strategy: PartitionStrategy, workers: usize) -> Arc<dyn NonceSource> {
    match strategy {
        PartitionStrategy::SharedCounter => Arc::new(SharedCounter::new()),
        PartitionStrategy::Striped => Arc::new(Striped::new(workers)),
    }
}
