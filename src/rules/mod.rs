//! Game rules behind one capability set. The search engine only ever talks
//! to a board through [`Game`], so both variants share a single recursion.

pub mod cascade;
pub mod flip;

pub use cascade::{resolve, Cascade};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::{Player, Pos};
use crate::error::GameError;

/// Coarse game phase, derived only from board occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Opening,
    Middle,
    Late,
}

/// Search depth per phase. Which phase a board is in is the game's call;
/// how deep to look in each is configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthPolicy {
    pub opening: u32,
    pub middle: u32,
    pub late: u32,
}

impl DepthPolicy {
    pub fn depth_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Opening => self.opening,
            Phase::Middle => self.middle,
            Phase::Late => self.late,
        }
    }
}

/// Candidate cap applied before expanding a node: when more than
/// `threshold` moves are legal only the `cap` best-ranked are searched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchLimit {
    pub threshold: usize,
    pub cap: usize,
}

/// Everything the search needs from a game variant.
pub trait Game: Clone + Send + fmt::Debug + fmt::Display + 'static {
    /// What applying a move produced, for the presentation layer
    /// (cascade generations, flipped stones).
    type Effect: fmt::Debug + Send + 'static;

    const NAME: &'static str;

    /// Legal targets for `player`, row-major.
    fn legal_moves(&self, player: Player) -> Vec<Pos>;

    /// Apply in place. On error the board is unchanged.
    fn apply_move(&mut self, mv: Pos, player: Player) -> Result<Self::Effect, GameError>;

    fn terminal_winner(&self) -> Option<Player>;

    /// True once the game can no longer continue (a draw included).
    fn is_over(&self) -> bool { self.terminal_winner().is_some() }

    /// Heuristic score from `perspective`'s point of view.
    fn evaluate(&self, perspective: Player) -> i32;

    /// Cheap ordering key for `mv`; higher is searched first.
    fn move_priority(&self, mv: Pos, player: Player) -> i32;

    fn default_branch_limit(&self) -> Option<BranchLimit> { None }

    /// Hash of the exact cell contents (side to move excluded).
    fn signature(&self) -> u64;

    fn phase(&self) -> Phase;

    fn default_depth_policy() -> DepthPolicy;

    fn suggested_depth(&self, policy: &DepthPolicy) -> u32 { policy.depth_for(self.phase()).max(1) }

    fn dims(&self) -> (u8, u8);
}

pub fn legal_moves<G: Game>(board: &G, player: Player) -> Vec<Pos> { board.legal_moves(player) }

pub fn terminal_winner<G: Game>(board: &G) -> Option<Player> { board.terminal_winner() }

/// Copy-on-apply: the input board is never touched.
pub fn apply_move<G: Game>(board: &G, mv: Pos, player: Player) -> Result<(G, G::Effect), GameError> {
    let mut next = board.clone();
    let effect = next.apply_move(mv, player)?;
    Ok((next, effect))
}

/// Rank `moves` by [`Game::move_priority`] (stable, so ties keep row-major
/// order) and apply the branch limit if one is given.
pub fn order_moves<G: Game>(board: &G, player: Player, mut moves: Vec<Pos>, limit: Option<BranchLimit>) -> Vec<Pos> {
    moves.sort_by_key(|&m| -board.move_priority(m, player));
    if let Some(l) = limit {
        if moves.len() > l.threshold { moves.truncate(l.cap.max(1)); }
    }
    moves
}
