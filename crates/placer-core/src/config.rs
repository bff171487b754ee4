//! Simulator configuration.
//!
//! Everything the mining core consumes from its environment: worker count,
//! initial difficulty, verification quorum, payloads, the genesis seed mode
//! and the nonce partitioning strategy. [`SimConfig::validate`] is called
//! before any worker spawns; misconfiguration refuses to start rather than
//! silently degrading.

use crate::constants::{
    DEFAULT_DIFFICULTY, DEFAULT_PAYLOAD, DEFAULT_QUORUM, DEFAULT_WORKERS, DIGEST_HEX_LEN,
    ZERO_DIGEST,
};
use crate::digest::double_sha256_hex;
use crate::error::ConfigError;

/// How the genesis pending block's `prev_digest` is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenesisSeed {
    /// A 64-character all-zero sentinel.
    #[default]
    Zeroes,
    /// The double-SHA-256 digest of the genesis payload.
    PayloadDigest,
}

/// How the nonce space is partitioned across workers within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionStrategy {
    /// One shared atomic counter claimed by every worker.
    #[default]
    SharedCounter,
    /// Disjoint contiguous ranges, one per worker, advanced independently.
    Striped,
}

/// Configuration for one simulator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Number of mining workers (one OS thread each).
    pub workers: usize,
    /// Independent successful re-verifications required before commit.
    pub quorum: usize,
    /// Difficulty of the genesis pending block.
    pub initial_difficulty: u64,
    /// Payload of every block.
    pub payload: String,
    /// Genesis `prev_digest` seeding mode.
    pub genesis_seed: GenesisSeed,
    /// Nonce partitioning strategy.
    pub partition: PartitionStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            quorum: DEFAULT_QUORUM,
            initial_difficulty: DEFAULT_DIFFICULTY,
            payload: DEFAULT_PAYLOAD.to_string(),
            genesis_seed: GenesisSeed::default(),
            partition: PartitionStrategy::default(),
        }
    }
}

impl SimConfig {
    /// Validate the configuration before starting any worker.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoWorkers`] for a zero worker count
    /// - [`ConfigError::ZeroQuorum`] for a zero quorum
    /// - [`ConfigError::QuorumExceedsWorkers`] when the quorum can never be
    ///   reached by the configured pool
    /// - [`ConfigError::DifficultyTooHigh`] when no digest could ever meet
    ///   the initial difficulty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.quorum == 0 {
            return Err(ConfigError::ZeroQuorum);
        }
        if self.quorum > self.workers {
            return Err(ConfigError::QuorumExceedsWorkers {
                quorum: self.quorum,
                workers: self.workers,
            });
        }
        if self.initial_difficulty >= DIGEST_HEX_LEN as u64 {
            return Err(ConfigError::DifficultyTooHigh {
                difficulty: self.initial_difficulty,
                digest_len: DIGEST_HEX_LEN,
            });
        }
        Ok(())
    }

    /// The `prev_digest` seeding the genesis pending block.
    pub fn genesis_digest(&self) -> String {
        match self.genesis_seed {
            GenesisSeed::Zeroes => ZERO_DIGEST.to_string(),
            GenesisSeed::PayloadDigest => double_sha256_hex(self.payload.as_bytes()),
        }
    }
}
