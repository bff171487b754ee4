//! Block types and the canonical pipe-delimited encoding.
//!
//! A block's digest is the double-SHA-256 of its canonical encoding
//! `[id|prev_digest|payload|difficulty|nonce]`. The payload is opaque text
//! and a `|` inside it is not escaped; payloads containing the delimiter
//! are ambiguous by accepted design, not disambiguated here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::digest::double_sha256_hex;

/// A committed unit of the chain.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Sequence number, assigned at commit time. Genesis is 0.
    pub id: u64,
    /// Hex digest of the preceding block's canonical encoding, or the
    /// genesis seed for block 0.
    pub prev_digest: String,
    /// Opaque round data.
    pub payload: String,
    /// Exact number of leading `'0'` hex characters the block's digest
    /// carries.
    pub difficulty: u64,
    /// The nonce that produced a digest satisfying `difficulty`.
    pub nonce: u64,
}

impl Block {
    /// The canonical encoding that was hashed to mine this block.
    pub fn encode(&self) -> String {
        canonical(self.id, &self.prev_digest, &self.payload, self.difficulty, self.nonce)
    }

    /// Recompute this block's digest from its canonical encoding.
    pub fn digest(&self) -> String {
        double_sha256_hex(self.encode().as_bytes())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// The block currently being mined. Carries no nonce until sealed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingBlock {
    /// Sequence number this block will commit under.
    pub id: u64,
    /// Hex digest of the most recently committed block (or genesis seed).
    pub prev_digest: String,
    /// Opaque round data.
    pub payload: String,
    /// Difficulty the winning digest must meet exactly.
    pub difficulty: u64,
}

impl PendingBlock {
    /// Canonical encoding of this block under a candidate nonce.
    pub fn encode_with_nonce(&self, nonce: u64) -> String {
        canonical(self.id, &self.prev_digest, &self.payload, self.difficulty, nonce)
    }

    /// Seal the pending block with its winning nonce.
    pub fn seal(&self, nonce: u64) -> Block {
        Block {
            id: self.id,
            prev_digest: self.prev_digest.clone(),
            payload: self.payload.clone(),
            difficulty: self.difficulty,
            nonce,
        }
    }
}

fn canonical(id: u64, prev_digest: &str, payload: &str, difficulty: u64, nonce: u64) -> String {
    format!("[{id}|{prev_digest}|{payload}|{difficulty}|{nonce}]")
}
