//! # placer-miner
//! The concurrent nonce-search-and-commit protocol: nonce partitioning,
//! round coordination (election, quorum verification, single commit), the
//! worker pool, and mining statistics.

pub mod partition;
pub mod pool;
pub mod round;
pub mod stats;

pub use pool::MinerPool;
pub use round::{Candidate, Phase, RoundCoordinator, Verdict};
