//! Error types for the Placer simulator.
//!
//! Verification failures during a round are not errors; they are state
//! transitions handled inside the miner. The only fallible surface is
//! configuration validation at startup, which refuses to run rather than
//! degrade.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")] NoWorkers,
    #[error("quorum must be at least 1")] ZeroQuorum,
    #[error("quorum {quorum} exceeds worker count {workers}")] QuorumExceedsWorkers { quorum: usize, workers: usize },
    #[error("initial difficulty {difficulty} must be below the digest length {digest_len}")] DifficultyTooHigh { difficulty: u64, digest_len: usize },
}
