//! Protocol constants for the Placer simulator.

/// Length of a rendered digest in lowercase hex characters (32 bytes × 2).
pub const DIGEST_HEX_LEN: usize = 64;

/// Difficulty ceiling: the digest's bit length.
///
/// The difficulty bump after each commit saturates here and then stays
/// constant. Note that the threshold check operates on the 64-character hex
/// rendering, so difficulties of [`DIGEST_HEX_LEN`] and above can never be
/// satisfied. The ceiling is kept at the bit length anyway, matching the
/// reference behavior.
pub const MAX_DIFFICULTY: u64 = 256;

/// Payload placed in every block by default.
pub const DEFAULT_PAYLOAD: &str = "This is the initial data in the 1st block";

/// Difficulty of the first pending block by default.
pub const DEFAULT_DIFFICULTY: u64 = 1;

/// Default number of mining workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default verification quorum.
pub const DEFAULT_QUORUM: usize = 2;

/// The all-zero digest sentinel seeding the genesis block's `prev_digest`.
pub const ZERO_DIGEST: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
