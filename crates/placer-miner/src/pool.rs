//! The worker pool and the per-worker control loop.
//!
//! Each worker is a long-lived OS thread alternating between searching and,
//! once a candidate is elected, verifying. The shutdown flag is checked at
//! least once per nonce attempt, so shutdown latency is bounded by a single
//! hash computation. The worker that wins the election becomes the round's
//! discoverer: it casts its own verification vote like every other worker,
//! parks until the quorum resolves the round, and is the only thread that
//! ever calls [`Chain::commit`].

use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use placer_core::chain::Chain;
use placer_core::config::SimConfig;
use placer_core::digest::double_sha256_hex;
use placer_core::error::ConfigError;
use placer_core::threshold::meets_threshold;
use placer_core::types::PendingBlock;

use crate::partition::{make_source, NonceSource};
use crate::round::{Candidate, Phase, RoundCoordinator, Verdict};
use crate::stats::MiningStats;

/// Everything a worker thread shares with the rest of the pool.
#[derive(Clone)]
struct WorkerCtx {
    chain: Arc<Chain>,
    coordinator: Arc<RoundCoordinator>,
    nonces: Arc<dyn NonceSource>,
    stats: Arc<MiningStats>,
}

/// A running pool of mining workers over one shared chain.
pub struct MinerPool {
    chain: Arc<Chain>,
    coordinator: Arc<RoundCoordinator>,
    stats: Arc<MiningStats>,
    handles: Vec<JoinHandle<()>>,
}

impl MinerPool {
    /// Validate `config` and spawn one worker thread per configured worker.
    ///
    /// # Errors
    ///
    /// Returns the configuration error when the quorum, worker count, or
    /// initial difficulty is unusable; nothing is spawned in that case.
    pub fn spawn(config: &SimConfig, chain: Arc<Chain>) -> Result<Self, ConfigError> {
        config.validate()?;

        let coordinator = Arc::new(RoundCoordinator::new(config.quorum));
        let nonces = make_source(config.partition, config.workers);
        let stats = Arc::new(MiningStats::new());

        let ctx = WorkerCtx {
            chain: Arc::clone(&chain),
            coordinator: Arc::clone(&coordinator),
            nonces,
            stats: Arc::clone(&stats),
        };

        let handles = (0..config.workers)
            .map(|worker| {
                let ctx = ctx.clone();
                std::thread::Builder::new()
                    .name(format!("miner-{worker}"))
                    .spawn(move || worker_loop(worker, ctx))
                    // Thread spawn failure is resource exhaustion: fatal.
                    .expect("failed to spawn worker thread")
            })
            .collect();

        info!(
            workers = config.workers,
            quorum = config.quorum,
            difficulty = config.initial_difficulty,
            partition = ?config.partition,
            "miner pool started"
        );

        Ok(Self { chain, coordinator, stats, handles })
    }

    /// The shared chain this pool mines.
    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    /// Pool-wide mining statistics.
    pub fn stats(&self) -> &Arc<MiningStats> {
        &self.stats
    }

    /// Request shutdown and join every worker.
    ///
    /// An in-flight round is abandoned; the committed chain is never left
    /// partially mutated.
    pub fn shutdown(self) {
        self.coordinator.shutdown();
        for handle in self.handles {
            handle.join().ok();
        }
        info!(
            blocks = self.stats.blocks_committed(),
            rejected = self.stats.rounds_rejected(),
            hashes = self.stats.hashes_computed(),
            "miner pool stopped"
        );
    }
}

/// Re-derive the candidate digest from this worker's own pending snapshot
/// and check it against the threshold.
fn verify_candidate(pending: &PendingBlock, candidate: &Candidate) -> bool {
    let digest = double_sha256_hex(pending.encode_with_nonce(candidate.nonce).as_bytes());
    digest == candidate.digest && meets_threshold(&digest, pending.difficulty)
}

/// The per-worker control loop.
fn worker_loop(worker: usize, ctx: WorkerCtx) {
    debug!(worker, "worker started");
    let mut epoch = ctx.coordinator.epoch();
    let mut pending = ctx.chain.pending();
    let mut voted_epoch: Option<u64> = None;

    while !ctx.coordinator.is_shutdown() {
        // A resolved round moved the pending block; refresh the snapshot
        // before doing anything else with it.
        let current = ctx.coordinator.epoch();
        if current != epoch {
            epoch = current;
            pending = ctx.chain.pending();
        }

        match ctx.coordinator.phase() {
            Phase::Searching => {
                let nonce = ctx.nonces.next_nonce(worker);
                let digest =
                    double_sha256_hex(pending.encode_with_nonce(nonce).as_bytes());
                ctx.stats.record_hashes(1);
                if meets_threshold(&digest, pending.difficulty)
                    && ctx.coordinator.try_elect(epoch, nonce, &digest)
                {
                    debug!(worker, block = pending.id, nonce, %digest, "candidate elected");
                    resolve_round(worker, &ctx, &pending, epoch, &mut voted_epoch);
                }
            }
            Phase::Verifying => {
                let Some(candidate) = ctx.coordinator.candidate() else {
                    // The round resolved between the phase load and the
                    // candidate fetch; loop around and re-observe.
                    continue;
                };
                if candidate.epoch != epoch {
                    // Stale snapshot for this candidate; refresh first.
                    continue;
                }
                if voted_epoch != Some(candidate.epoch) {
                    let approve = verify_candidate(&pending, &candidate);
                    ctx.stats.record_hashes(1);
                    if approve {
                        debug!(worker, nonce = candidate.nonce, "digest verified");
                    } else {
                        warn!(
                            worker,
                            block = pending.id,
                            nonce = candidate.nonce,
                            "verification failed; vetoing round"
                        );
                    }
                    ctx.coordinator.record_vote(candidate.epoch, approve);
                    voted_epoch = Some(candidate.epoch);
                }
                ctx.coordinator.await_round_end(candidate.epoch);
            }
        }
    }
    debug!(worker, "worker stopped");
}

/// Discoverer path: vote, await the quorum's verdict, then either commit
/// and open the next round or abandon the candidate.
fn resolve_round(
    worker: usize,
    ctx: &WorkerCtx,
    pending: &PendingBlock,
    epoch: u64,
    voted_epoch: &mut Option<u64>,
) {
    // The discoverer is a quorum member like any other: it re-derives its
    // own candidate and casts one vote, so a quorum of the full worker
    // count stays reachable.
    let Some(candidate) = ctx.coordinator.candidate() else {
        return;
    };
    let approve = verify_candidate(pending, &candidate);
    ctx.stats.record_hashes(1);
    ctx.coordinator.record_vote(epoch, approve);
    *voted_epoch = Some(epoch);

    match ctx.coordinator.await_verdict() {
        Verdict::Approved => {
            let id = ctx.chain.commit(
                &candidate.digest,
                &pending.payload,
                pending.difficulty,
                candidate.nonce,
            );
            ctx.stats.record_commit();
            info!(
                worker,
                block = id,
                nonce = candidate.nonce,
                digest = %candidate.digest,
                difficulty = pending.difficulty,
                "block committed"
            );
            ctx.nonces.reset();
            ctx.coordinator.finish_round();
        }
        Verdict::Rejected => {
            warn!(
                worker,
                block = pending.id,
                nonce = candidate.nonce,
                "candidate rejected; reopening search"
            );
            ctx.stats.record_rejection();
            ctx.nonces.reset();
            ctx.coordinator.finish_round();
        }
        Verdict::Shutdown => {
            // Abandon the in-flight round; all of its state is
            // round-scoped memory.
        }
    }
}
