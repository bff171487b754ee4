//! Append-only chain store.
//!
//! Owns the committed block sequence plus exactly one pending block (the
//! block currently being mined). Workers only read pending snapshots; the
//! committed sequence is mutated solely through [`Chain::commit`], which the
//! round coordinator guarantees is called by exactly one worker per round.
//! The interior `RwLock` additionally keeps every reader's snapshot
//! internally consistent while a commit swaps the pending block.

use parking_lot::RwLock;

use crate::config::SimConfig;
use crate::constants::MAX_DIFFICULTY;
use crate::types::{Block, PendingBlock};

struct ChainInner {
    blocks: Vec<Block>,
    pending: PendingBlock,
}

/// The shared chain: committed blocks plus the pending block under search.
pub struct Chain {
    inner: RwLock<ChainInner>,
    /// Payload given to every freshly opened pending block.
    round_payload: String,
}

impl Chain {
    /// Open a chain with an empty committed sequence and the genesis
    /// pending block described by `config`.
    pub fn new(config: &SimConfig) -> Self {
        let pending = PendingBlock {
            id: 0,
            prev_digest: config.genesis_digest(),
            payload: config.payload.clone(),
            difficulty: config.initial_difficulty,
        };
        Self {
            inner: RwLock::new(ChainInner { blocks: Vec::new(), pending }),
            round_payload: config.payload.clone(),
        }
    }

    /// Snapshot of the pending block. Consistent even while a commit is in
    /// flight; safe for any number of concurrent readers.
    pub fn pending(&self) -> PendingBlock {
        self.inner.read().pending.clone()
    }

    /// Commit the current round's winner and open the next round's pending
    /// block in one atomic step.
    ///
    /// Appends a block built from the pending fields and the winning
    /// `(payload, difficulty, nonce)`, then replaces the pending block with
    /// a fresh one whose `prev_digest` is the winning `digest` and whose
    /// difficulty is bumped by one, saturating at [`MAX_DIFFICULTY`].
    ///
    /// Must be called by exactly one caller per round. Returns the
    /// committed block's id.
    pub fn commit(&self, digest: &str, payload: &str, difficulty: u64, nonce: u64) -> u64 {
        let mut inner = self.inner.write();
        let committed = Block {
            id: inner.pending.id,
            prev_digest: inner.pending.prev_digest.clone(),
            payload: payload.to_string(),
            difficulty,
            nonce,
        };
        let committed_id = committed.id;
        inner.blocks.push(committed);
        inner.pending = PendingBlock {
            id: committed_id + 1,
            prev_digest: digest.to_string(),
            payload: self.round_payload.clone(),
            difficulty: (difficulty + 1).min(MAX_DIFFICULTY),
        };
        committed_id
    }

    /// Whether no block has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().blocks.is_empty()
    }

    /// Number of committed blocks.
    pub fn len(&self) -> usize {
        self.inner.read().blocks.len()
    }

    /// Id of the most recently committed block, if any.
    pub fn last_committed_id(&self) -> Option<u64> {
        self.inner.read().blocks.last().map(|b| b.id)
    }

    /// Digest of the most recently committed block, if any.
    ///
    /// This equals the pending block's `prev_digest` whenever the chain is
    /// non-empty.
    pub fn last_committed_digest(&self) -> Option<String> {
        let inner = self.inner.read();
        if inner.blocks.is_empty() {
            None
        } else {
            Some(inner.pending.prev_digest.clone())
        }
    }

    /// Copy of the committed sequence, oldest first.
    pub fn blocks(&self) -> Vec<Block> {
        self.inner.read().blocks.clone()
    }

    /// Text dump: one canonical block line per committed block.
    pub fn dump(&self) -> String {
        let inner = self.inner.read();
        let mut out = String::new();
        for block in &inner.blocks {
            out.push_str(&block.encode());
            out.push('\n');
        }
        out
    }
}
