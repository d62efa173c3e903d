//! Running searches away from the interactive thread.
//!
//! A worker owns a frozen copy of the board, runs the full search on its own
//! thread and hands back exactly one [`Decision`] through a channel. The
//! caller's board is never shared with it, so cancelling can't corrupt
//! anything.

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::board::{Player, Pos};
use crate::rules::Game;
use crate::search::noise::random_legal_move;
use crate::search::{SearchParams, SearchResult, Searcher};

/// What the engine decided to play, and how it got there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub mv: Option<Pos>,
    pub player: Player,
    /// The search produced nothing usable and a random legal move was taken.
    pub fallback: bool,
    /// Signature of the board the decision was made for.
    pub snapshot: u64,
    pub search: SearchResult,
}

/// Run the search and never come back empty-handed while a legal move
/// exists.
pub fn decide<G: Game, R: Rng + ?Sized>(searcher: &mut Searcher, board: &G, player: Player, params: SearchParams, rng: &mut R) -> Decision {
    let search = searcher.search_with_params(board, player, params);
    let legal = board.legal_moves(player);
    let searched = search.best_move.filter(|m| legal.contains(m));
    let (mv, fallback) = match searched {
        Some(m) => (Some(m), false),
        None => (random_legal_move(board, player, rng), !legal.is_empty()),
    };
    if fallback { debug!("{}: search gave no move for {player}, using random fallback", G::NAME); }
    Decision { mv, player, fallback, snapshot: board.signature(), search }
}

/// Params the interactive front ends use: iterative deepening with a
/// transposition table under a wall-clock budget.
pub fn interactive_params(time_budget: Duration, depth_budget: u32) -> SearchParams {
    SearchParams { depth: depth_budget, movetime: Some(time_budget), use_tt: true, iterative: true, ..SearchParams::default() }
}

/// Synchronous move choice. `None` only when `player` has no legal move.
pub fn choose_move<G: Game>(board: &G, player: Player, time_budget: Duration, depth_budget: u32) -> Option<Pos> {
    let mut searcher = Searcher::default();
    let mut rng = SmallRng::from_entropy();
    decide(&mut searcher, board, player, interactive_params(time_budget, depth_budget), &mut rng).mv
}

/// Asynchronous move choice returning a cancelable handle.
pub fn choose_move_async<G: Game>(board: &G, player: Player, params: SearchParams) -> SearchHandle {
    SearchWorker::spawn(board, player, params, rand::random())
}

pub struct SearchWorker;

impl SearchWorker {
    /// Start searching a snapshot of `board` on a new thread.
    pub fn spawn<G: Game>(board: &G, player: Player, params: SearchParams, seed: u64) -> SearchHandle {
        let snapshot = board.clone();
        let signature = board.signature();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let (tx, rx) = channel();
        let join = thread::Builder::new()
            .name(format!("{}-search", G::NAME))
            .spawn(move || {
                let mut searcher = Searcher::with_abort(flag);
                let mut rng = SmallRng::seed_from_u64(seed);
                let decision = decide(&mut searcher, &snapshot, player, params, &mut rng);
                // The handle may be gone already; nothing to report to then.
                let _ = tx.send(decision);
            });
        let join = match join {
            Ok(j) => Some(j),
            Err(e) => {
                log::error!("could not start search thread: {e}");
                None
            }
        };
        SearchHandle { cancel, rx, join, signature, player, started: Instant::now() }
    }
}

/// Owner's side of one in-flight search.
pub struct SearchHandle {
    cancel: Arc<AtomicBool>,
    rx: Receiver<Decision>,
    join: Option<JoinHandle<()>>,
    signature: u64,
    player: Player,
    started: Instant,
}

impl SearchHandle {
    /// Ask the search to stop; it returns its best-so-far at the next node.
    pub fn cancel(&self) { self.cancel.store(true, Ordering::Relaxed); }

    pub fn is_cancelled(&self) -> bool { self.cancel.load(Ordering::Relaxed) }

    pub fn player(&self) -> Player { self.player }

    pub fn snapshot_signature(&self) -> u64 { self.signature }

    pub fn elapsed(&self) -> Duration { self.started.elapsed() }

    pub fn is_finished(&self) -> bool { self.join.as_ref().map_or(true, JoinHandle::is_finished) }

    /// Non-blocking poll. `Some` at most once per search.
    pub fn try_result(&mut self) -> Option<Decision> {
        match self.rx.try_recv() {
            Ok(d) => {
                self.reap();
                Some(d)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the search finishes.
    pub fn wait(mut self) -> Option<Decision> {
        let d = self.rx.recv().ok();
        self.reap();
        d
    }

    /// Block for at most `limit`; past it the search is cancelled and its
    /// best-so-far collected.
    pub fn wait_timeout(mut self, limit: Duration) -> Option<Decision> {
        let d = match self.rx.recv_timeout(limit) {
            Ok(d) => Some(d),
            Err(RecvTimeoutError::Timeout) => {
                self.cancel();
                self.rx.recv().ok()
            }
            Err(RecvTimeoutError::Disconnected) => None,
        };
        self.reap();
        d
    }

    fn reap(&mut self) {
        if let Some(j) = self.join.take() {
            if j.join().is_err() { log::error!("search thread panicked"); }
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        // An abandoned search should not keep burning a core.
        self.cancel();
    }
}
