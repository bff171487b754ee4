//! Mining round coordination.
//!
//! Drives one round through `SEARCHING → CANDIDATE_FOUND → VERIFYING →
//! (COMMITTED | REJECTED) → SEARCHING`, guaranteeing that at most one worker
//! wins the candidate election per round and that a commit happens only
//! after the configured quorum of independent re-verifications.
//!
//! The search hot path touches nothing but two atomic loads per nonce
//! attempt (`phase` and `epoch`); the election and the vote counter live
//! behind one narrow mutex that is only taken when a worker actually finds
//! or verifies a candidate. Waiting workers park on condvars instead of
//! spinning.
//!
//! Rounds are identified by a generation counter (`epoch`) rather than the
//! pending block id: a rejected round reopens search on the same pending
//! block, and nonce assignments and votes must not leak between the two
//! attempts.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

/// Observable round phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Workers are racing through the nonce space.
    Searching,
    /// A candidate is elected; workers re-derive and vote.
    Verifying,
}

/// The round's elected candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Round generation the candidate belongs to.
    pub epoch: u64,
    /// The discovered nonce.
    pub nonce: u64,
    /// Hex digest the discoverer derived for `nonce`.
    pub digest: String,
}

/// Resolution of a round as seen by the discoverer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The quorum confirmed the candidate; the discoverer must commit.
    Approved,
    /// A verifier vetoed the candidate; the round is abandoned.
    Rejected,
    /// Shutdown was requested while the round was in flight.
    Shutdown,
}

struct RoundSync {
    candidate: Option<Candidate>,
    approvals: usize,
    rejected: bool,
}

/// Shared state machine coordinating one round at a time.
pub struct RoundCoordinator {
    /// Hot-path flag: the only round state read per nonce attempt.
    phase: AtomicU8,
    /// Round generation; bumped on every resolution (commit or reject).
    epoch: AtomicU64,
    stop: AtomicBool,
    quorum: usize,
    /// Election result and vote tally. Epoch transitions happen under this
    /// lock, so epoch checks inside it are race-free.
    sync: Mutex<RoundSync>,
    /// Parks the discoverer until quorum, veto, or shutdown.
    verdict: Condvar,
    /// Parks verified-and-waiting workers until the round resolves.
    resolved: Condvar,
}

const PHASE_SEARCHING: u8 = 0;
const PHASE_VERIFYING: u8 = 1;

impl RoundCoordinator {
    /// Create a coordinator requiring `quorum` successful verifications per
    /// commit. The quorum is validated against the worker count at config
    /// time, before the pool spawns.
    pub fn new(quorum: usize) -> Self {
        Self {
            phase: AtomicU8::new(PHASE_SEARCHING),
            epoch: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            quorum,
            sync: Mutex::new(RoundSync {
                candidate: None,
                approvals: 0,
                rejected: false,
            }),
            verdict: Condvar::new(),
            resolved: Condvar::new(),
        }
    }

    /// Current phase. One atomic load; safe on the hash hot path.
    pub fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            PHASE_SEARCHING => Phase::Searching,
            _ => Phase::Verifying,
        }
    }

    /// Current round generation.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// The configured quorum.
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Successful verifications recorded for the current candidate.
    pub fn approvals(&self) -> usize {
        self.sync.lock().approvals
    }

    /// Attempt to elect `(nonce, digest)` as the round's candidate.
    ///
    /// First writer wins: exactly one call per round returns `true`, and the
    /// winner becomes the round's discoverer (it must see the round through
    /// [`await_verdict`](Self::await_verdict) and
    /// [`finish_round`](Self::finish_round)). Losers, discoveries carrying a
    /// stale `epoch`, and post-shutdown attempts are ignored.
    pub fn try_elect(&self, epoch: u64, nonce: u64, digest: &str) -> bool {
        let mut sync = self.sync.lock();
        if self.stop.load(Ordering::Acquire) {
            return false;
        }
        if self.epoch.load(Ordering::Acquire) != epoch {
            return false;
        }
        if sync.candidate.is_some() {
            return false;
        }
        sync.candidate = Some(Candidate {
            epoch,
            nonce,
            digest: digest.to_string(),
        });
        sync.approvals = 0;
        sync.rejected = false;
        self.phase.store(PHASE_VERIFYING, Ordering::Release);
        true
    }

    /// The elected candidate, if the round has one.
    pub fn candidate(&self) -> Option<Candidate> {
        self.sync.lock().candidate.clone()
    }

    /// Record one worker's verification result for the round `epoch`.
    ///
    /// Votes for an already-resolved round are dropped. An approval wakes
    /// the discoverer once the quorum is reached; a single veto rejects the
    /// round immediately, regardless of prior approvals. Each worker votes
    /// at most once per round (the worker loop tracks its last-voted epoch).
    pub fn record_vote(&self, epoch: u64, approve: bool) {
        let mut sync = self.sync.lock();
        match sync.candidate.as_ref() {
            Some(candidate) if candidate.epoch == epoch => {}
            _ => return,
        }
        if sync.rejected {
            return;
        }
        if approve {
            sync.approvals += 1;
            if sync.approvals >= self.quorum {
                self.verdict.notify_all();
            }
        } else {
            sync.rejected = true;
            self.verdict.notify_all();
        }
    }

    /// Park the discoverer until the round resolves.
    pub fn await_verdict(&self) -> Verdict {
        let mut sync = self.sync.lock();
        loop {
            if self.stop.load(Ordering::Acquire) {
                return Verdict::Shutdown;
            }
            if sync.rejected {
                return Verdict::Rejected;
            }
            if sync.approvals >= self.quorum {
                return Verdict::Approved;
            }
            self.verdict.wait(&mut sync);
        }
    }

    /// Close the current round and reopen search.
    ///
    /// Called only by the discoverer, after `Chain::commit` returned (or
    /// after a rejection) and after the nonce source was reset. This
    /// ordering is what guarantees that a commit strictly precedes any
    /// search activity against the next round.
    pub fn finish_round(&self) {
        let mut sync = self.sync.lock();
        sync.candidate = None;
        sync.approvals = 0;
        sync.rejected = false;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.phase.store(PHASE_SEARCHING, Ordering::Release);
        self.resolved.notify_all();
    }

    /// Park until round `epoch` resolves (or shutdown).
    pub fn await_round_end(&self, epoch: u64) {
        let mut sync = self.sync.lock();
        while self.epoch.load(Ordering::Acquire) == epoch && !self.stop.load(Ordering::Acquire) {
            self.resolved.wait(&mut sync);
        }
    }

    /// Request shutdown and wake every parked worker.
    pub fn shutdown(&self) {
        // Taking the lock serializes with parked waiters' re-checks so the
        // notifications cannot be lost.
        let _sync = self.sync.lock();
        self.stop.store(true, Ordering::Release);
        self.verdict.notify_all();
        self.resolved.notify_all();
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Barrier;
    use std::sync::mpsc;
    use std::time::Duration;

    // ------------------------------------------------------------------
    // Election
    // ------------------------------------------------------------------

    #[test]
    fn elect_flips_phase_and_records_candidate() {
        let coord = RoundCoordinator::new(1);
        assert_eq!(coord.phase(), Phase::Searching);

        assert!(coord.try_elect(0, 42, "0abc"));
        assert_eq!(coord.phase(), Phase::Verifying);
        let candidate = coord.candidate().expect("candidate recorded");
        assert_eq!(candidate, Candidate { epoch: 0, nonce: 42, digest: "0abc".to_string() });
    }

    #[test]
    fn second_elect_loses() {
        let coord = RoundCoordinator::new(1);
        assert!(coord.try_elect(0, 1, "0aa"));
        assert!(!coord.try_elect(0, 2, "0bb"));
        // The winner's candidate is untouched.
        assert_eq!(coord.candidate().expect("candidate").nonce, 1);
    }

    #[test]
    fn stale_epoch_elect_loses() {
        let coord = RoundCoordinator::new(1);
        assert!(coord.try_elect(0, 1, "0aa"));
        coord.record_vote(0, true);
        assert_eq!(coord.await_verdict(), Verdict::Approved);
        coord.finish_round();

        // A straggler still holding epoch 0 cannot elect into round 1.
        assert!(!coord.try_elect(0, 9, "0cc"));
        assert_eq!(coord.phase(), Phase::Searching);
    }

    #[test]
    fn elect_after_shutdown_loses() {
        let coord = RoundCoordinator::new(1);
        coord.shutdown();
        assert!(!coord.try_elect(0, 1, "0aa"));
    }

    #[test]
    fn election_is_linearizable_under_races() {
        use rand::Rng;

        // Many workers discover simultaneously; exactly one must win,
        // across many randomized interleavings.
        for round in 0..200 {
            let coord = Arc::new(RoundCoordinator::new(1));
            let barrier = Arc::new(Barrier::new(8));
            let handles: Vec<_> = (0..8u64)
                .map(|worker| {
                    let coord = Arc::clone(&coord);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        let jitter = rand::thread_rng().gen_range(0..50);
                        barrier.wait();
                        std::thread::sleep(Duration::from_micros(jitter));
                        coord.try_elect(0, worker, "0digest")
                    })
                })
                .collect();
            let winners = handles
                .into_iter()
                .map(|h| h.join().expect("elector thread"))
                .filter(|won| *won)
                .count();
            assert_eq!(winners, 1, "iteration {round}");

            // Every loser was ignored: the single recorded candidate's
            // nonce identifies the winner.
            assert!(coord.candidate().is_some());
            assert_eq!(coord.phase(), Phase::Verifying);
        }
    }

    // ------------------------------------------------------------------
    // Quorum gating
    // ------------------------------------------------------------------

    /// Spawn a discoverer thread that reports the verdict over a channel.
    fn spawn_discoverer(coord: &Arc<RoundCoordinator>) -> mpsc::Receiver<Verdict> {
        let (tx, rx) = mpsc::channel();
        let coord = Arc::clone(coord);
        std::thread::spawn(move || {
            tx.send(coord.await_verdict()).ok();
        });
        rx
    }

    #[test]
    fn quorum_of_three_needs_three_approvals() {
        let coord = Arc::new(RoundCoordinator::new(3));
        assert!(coord.try_elect(0, 7, "0digest"));
        let verdict = spawn_discoverer(&coord);

        coord.record_vote(0, true);
        coord.record_vote(0, true);
        // Two approvals must not resolve the round.
        assert!(verdict.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(coord.approvals(), 2);

        coord.record_vote(0, true);
        assert_eq!(
            verdict.recv_timeout(Duration::from_secs(5)).expect("verdict"),
            Verdict::Approved
        );
    }

    #[test]
    fn single_veto_rejects_despite_prior_approvals() {
        let coord = Arc::new(RoundCoordinator::new(3));
        assert!(coord.try_elect(0, 7, "0digest"));
        let verdict = spawn_discoverer(&coord);

        coord.record_vote(0, true);
        coord.record_vote(0, true);
        coord.record_vote(0, false);
        assert_eq!(
            verdict.recv_timeout(Duration::from_secs(5)).expect("verdict"),
            Verdict::Rejected
        );
    }

    #[test]
    fn quorum_of_one_resolves_on_first_approval() {
        let coord = Arc::new(RoundCoordinator::new(1));
        assert!(coord.try_elect(0, 7, "0digest"));
        coord.record_vote(0, true);
        // Verdict already decided; no parking needed.
        assert_eq!(coord.await_verdict(), Verdict::Approved);
    }

    #[test]
    fn approvals_after_veto_do_not_resurrect_the_round() {
        let coord = Arc::new(RoundCoordinator::new(2));
        assert!(coord.try_elect(0, 7, "0digest"));
        coord.record_vote(0, false);
        coord.record_vote(0, true);
        coord.record_vote(0, true);
        assert_eq!(coord.await_verdict(), Verdict::Rejected);
    }

    #[test]
    fn stale_votes_are_dropped() {
        let coord = Arc::new(RoundCoordinator::new(2));
        assert!(coord.try_elect(0, 7, "0digest"));
        coord.record_vote(0, true);
        coord.record_vote(0, true);
        assert_eq!(coord.await_verdict(), Verdict::Approved);
        coord.finish_round();

        // Round 1 opens; late round-0 votes must not count toward it.
        assert!(coord.try_elect(1, 9, "0other"));
        coord.record_vote(0, true);
        coord.record_vote(0, false);
        assert_eq!(coord.approvals(), 0);
        let verdict = spawn_discoverer(&coord);
        assert!(verdict.recv_timeout(Duration::from_millis(100)).is_err());

        coord.record_vote(1, true);
        coord.record_vote(1, true);
        assert_eq!(
            verdict.recv_timeout(Duration::from_secs(5)).expect("verdict"),
            Verdict::Approved
        );
    }

    #[test]
    fn votes_without_candidate_are_dropped() {
        let coord = RoundCoordinator::new(1);
        coord.record_vote(0, true);
        assert_eq!(coord.approvals(), 0);
        assert_eq!(coord.phase(), Phase::Searching);
    }

    // ------------------------------------------------------------------
    // Round lifecycle
    // ------------------------------------------------------------------

    #[test]
    fn finish_round_reopens_search_and_bumps_epoch() {
        let coord = RoundCoordinator::new(1);
        assert!(coord.try_elect(0, 1, "0aa"));
        coord.record_vote(0, true);
        assert_eq!(coord.await_verdict(), Verdict::Approved);

        coord.finish_round();
        assert_eq!(coord.phase(), Phase::Searching);
        assert_eq!(coord.epoch(), 1);
        assert_eq!(coord.candidate(), None);
        assert_eq!(coord.approvals(), 0);
    }

    #[test]
    fn await_round_end_returns_after_resolution() {
        let coord = Arc::new(RoundCoordinator::new(1));
        assert!(coord.try_elect(0, 1, "0aa"));

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let coord = Arc::clone(&coord);
            std::thread::spawn(move || {
                coord.await_round_end(0);
                tx.send(()).ok();
            })
        };
        // Unresolved round keeps the waiter parked.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        coord.record_vote(0, true);
        assert_eq!(coord.await_verdict(), Verdict::Approved);
        coord.finish_round();

        rx.recv_timeout(Duration::from_secs(5)).expect("waiter woke");
        waiter.join().expect("waiter thread");
    }

    #[test]
    fn await_round_end_returns_immediately_for_resolved_epoch() {
        let coord = RoundCoordinator::new(1);
        assert!(coord.try_elect(0, 1, "0aa"));
        coord.record_vote(0, true);
        coord.finish_round();
        // Round 0 is gone; must not park.
        coord.await_round_end(0);
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    #[test]
    fn shutdown_wakes_discoverer_and_waiters() {
        let coord = Arc::new(RoundCoordinator::new(2));
        assert!(coord.try_elect(0, 1, "0aa"));

        let verdict = spawn_discoverer(&coord);
        let (tx, rx) = mpsc::channel();
        let waiter = {
            let coord = Arc::clone(&coord);
            std::thread::spawn(move || {
                coord.await_round_end(0);
                tx.send(()).ok();
            })
        };

        coord.shutdown();
        assert_eq!(
            verdict.recv_timeout(Duration::from_secs(5)).expect("verdict"),
            Verdict::Shutdown
        );
        rx.recv_timeout(Duration::from_secs(5)).expect("waiter woke");
        waiter.join().expect("waiter thread");
        assert!(coord.is_shutdown());
    }
}
