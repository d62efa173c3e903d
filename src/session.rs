//! The authoritative game: one board, whose turn it is, and at most one
//! engine search in flight against a snapshot of it.
//!
//! The board only changes through this type, and never while a search is
//! pending: `play` and `pass_if_stuck` refuse, and `reset` drops the
//! handle first. A decision that reaches `accept` therefore always belongs
//! to the current board.

use log::{info, warn};
use std::time::Duration;

use crate::board::{Player, Pos};
use crate::error::GameError;
use crate::rules::Game;
use crate::search::SearchParams;
use crate::worker::{Decision, SearchHandle, SearchWorker};

/// What polling the engine produced.
#[derive(Debug)]
pub enum EngineStatus<E> {
    /// No search running.
    Idle,
    Thinking,
    /// The decision was applied to the board.
    Played { mv: Pos, effect: E, decision: Decision },
    /// The side to move had nothing to play; the turn passed.
    Passed { player: Player },
    /// The engine's move could not be applied; the board is unchanged.
    Discarded,
}

pub struct Session<G: Game> {
    board: G,
    to_move: Player,
    pending: Option<SearchHandle>,
    history: Vec<(Player, Pos)>,
    seed: u64,
}

impl<G: Game> Session<G> {
    pub fn new(board: G) -> Self {
        Self { board, to_move: Player::First, pending: None, history: Vec::new(), seed: 0 }
    }

    /// Seed for the engine's fallback choices; each search derives its own.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn board(&self) -> &G { &self.board }

    pub fn to_move(&self) -> Player { self.to_move }

    pub fn history(&self) -> &[(Player, Pos)] { &self.history }

    pub fn winner(&self) -> Option<Player> { self.board.terminal_winner() }

    pub fn is_over(&self) -> bool { self.board.is_over() }

    pub fn is_thinking(&self) -> bool { self.pending.is_some() }

    pub fn legal_moves(&self) -> Vec<Pos> { self.board.legal_moves(self.to_move) }

    /// A move by the side to move (usually the human).
    pub fn play(&mut self, pos: Pos) -> Result<G::Effect, GameError> {
        if self.pending.is_some() { return Err(GameError::InvalidMove { pos, reason: "engine is still thinking" }); }
        if self.is_over() { return Err(GameError::InvalidMove { pos, reason: "game is over" }); }
        if !self.legal_moves().contains(&pos) { return Err(GameError::InvalidMove { pos, reason: "not a legal move" }); }
        self.apply(pos)
    }

    fn apply(&mut self, pos: Pos) -> Result<G::Effect, GameError> {
        let effect = self.board.apply_move(pos, self.to_move)?;
        self.history.push((self.to_move, pos));
        self.to_move = self.to_move.opponent();
        Ok(effect)
    }

    /// Hand the turn over when the side to move is stuck but the game is
    /// not finished. Returns the condition that caused the pass. Does
    /// nothing while a search is pending; the engine reports the pass itself.
    pub fn pass_if_stuck(&mut self) -> Option<GameError> {
        if self.pending.is_some() || self.is_over() || !self.legal_moves().is_empty() { return None; }
        let player = self.to_move;
        self.to_move = player.opponent();
        Some(GameError::NoLegalMove { player })
    }

    /// Launch a search for the side to move. `false` if one is already
    /// running or the game is over.
    pub fn start_engine(&mut self, params: SearchParams) -> bool {
        if self.pending.is_some() || self.is_over() { return false; }
        let seed = self.seed ^ (self.history.len() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.pending = Some(SearchWorker::spawn(&self.board, self.to_move, params, seed));
        true
    }

    /// Non-blocking: apply the engine's move if it is ready.
    pub fn poll_engine(&mut self) -> EngineStatus<G::Effect> {
        let Some(handle) = self.pending.as_mut() else { return EngineStatus::Idle };
        match handle.try_result() {
            Some(decision) => {
                self.pending = None;
                self.accept(decision)
            }
            None if handle.is_finished() => {
                // Thread ended without reporting
                self.pending = None;
                EngineStatus::Idle
            }
            None => EngineStatus::Thinking,
        }
    }

    /// Blocking: wait up to `limit`, then cancel and take the best-so-far.
    pub fn wait_engine(&mut self, limit: Duration) -> EngineStatus<G::Effect> {
        let Some(handle) = self.pending.take() else { return EngineStatus::Idle };
        match handle.wait_timeout(limit) {
            Some(decision) => self.accept(decision),
            None => EngineStatus::Idle,
        }
    }

    fn accept(&mut self, decision: Decision) -> EngineStatus<G::Effect> {
        debug_assert_eq!(decision.snapshot, self.board.signature());
        let Some(mv) = decision.mv else {
            let player = self.to_move;
            self.to_move = player.opponent();
            return EngineStatus::Passed { player };
        };
        match self.apply(mv) {
            Ok(effect) => {
                info!("{} plays {mv} (score {}, depth {}, {} nodes)", decision.player, decision.search.score, decision.search.depth, decision.search.nodes);
                EngineStatus::Played { mv, effect, decision }
            }
            Err(e) => {
                warn!("engine proposed an unplayable move: {e}");
                EngineStatus::Discarded
            }
        }
    }

    /// Stop the running search, if any. The board is not touched.
    pub fn cancel_engine(&mut self) {
        if let Some(h) = self.pending.take() { h.cancel(); }
    }

    /// Start over from `board`. Any in-flight search is cancelled and its
    /// result will never be applied.
    pub fn reset(&mut self, board: G) {
        self.cancel_engine();
        self.board = board;
        self.to_move = Player::First;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CascadeBoard, FlipBoard};

    #[test]
    fn human_move_switches_turn() {
        let mut s = Session::new(FlipBoard::new());
        let flipped = s.play(Pos::new(2, 3)).unwrap();
        assert_eq!(flipped.len(), 1);
        assert_eq!(s.to_move(), Player::Second);
        assert_eq!(s.history(), &[(Player::First, Pos::new(2, 3))]);
    }

    #[test]
    fn illegal_human_move_is_rejected() {
        let mut s = Session::new(FlipBoard::new());
        assert!(matches!(s.play(Pos::new(0, 0)), Err(GameError::InvalidMove { .. })));
        assert_eq!(s.to_move(), Player::First);
    }

    #[test]
    fn engine_move_is_applied() {
        let mut s = Session::new(CascadeBoard::new());
        let mut p = SearchParams::default();
        p.depth = 1;
        assert!(s.start_engine(p));
        assert!(!s.start_engine(p), "only one search at a time");
        match s.wait_engine(Duration::from_secs(5)) {
            EngineStatus::Played { mv, .. } => assert_eq!(s.history(), &[(Player::First, mv)]),
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(s.to_move(), Player::Second);
    }
}
