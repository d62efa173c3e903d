use log::debug;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::{Player, Pos};
use crate::rules::{order_moves, BranchLimit, DepthPolicy, Game};
use crate::search::eval::{WIN_SCORE, WIN_THRESHOLD};
use crate::search::tt::{Bound, Entry, Tt};

/// Window bound wider than any score, for full-window calls to [`Searcher::search`].
pub const INF: i32 = WIN_SCORE + 1;
const DEFAULT_TT_ENTRIES: usize = 1 << 16;

/// Which candidate cap applies before a node is expanded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Branching {
    /// Whatever the game ships with ([`Game::default_branch_limit`]).
    #[default]
    GameDefault,
    Unlimited,
    Limit(BranchLimit),
}

impl Branching {
    fn resolve<G: Game>(self, board: &G) -> Option<BranchLimit> {
        match self {
            Branching::GameDefault => board.default_branch_limit(),
            Branching::Unlimited => None,
            Branching::Limit(l) => Some(l),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Maximum depth; 0 picks one from the depth policy.
    pub depth: u32,
    /// `None` uses the game's own policy.
    pub depth_policy: Option<DepthPolicy>,
    pub max_nodes: Option<u64>,
    pub movetime: Option<Duration>,
    pub use_tt: bool,
    pub tt_entries: usize,
    /// Search depth 1, 2, … up to the maximum instead of the maximum only.
    pub iterative: bool,
    /// Disable alpha-beta cutoffs (plain minimax), for verification.
    pub exhaustive: bool,
    pub branching: Branching,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            depth: 0,
            depth_policy: None,
            max_nodes: None,
            movetime: None,
            use_tt: false,
            tt_entries: DEFAULT_TT_ENTRIES,
            iterative: false,
            exhaustive: false,
            branching: Branching::GameDefault,
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub best_move: Option<Pos>,
    /// Backed-up value from the searching player's point of view.
    pub score: i32,
    /// Deepest iteration that finished inside the budget (0 if none did).
    pub depth: u32,
    pub nodes: u64,
    /// The deadline, node budget or a cancellation cut the search short.
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

/// Outcome of one recursive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub best: Option<Pos>,
    pub value: i32,
}

// Win scores are stored as distance from the node, not from the root.
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= WIN_THRESHOLD { score + ply } else if score <= -WIN_THRESHOLD { score - ply } else { score }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= WIN_THRESHOLD { score - ply } else if score <= -WIN_THRESHOLD { score + ply } else { score }
}

impl Node {
    fn leaf(value: i32) -> Self { Self { best: None, value } }
}

/// Depth-first minimax with alpha-beta pruning over any [`Game`]. Values are
/// always from the root player's point of view: that side maximizes, the
/// opponent minimizes.
pub struct Searcher {
    tt: Tt,
    pub(crate) nodes: u64,
    node_limit: u64,
    deadline: Option<Instant>,
    abort: Option<Arc<AtomicBool>>,
    truncated: bool,
    root: Player,
    use_tt: bool,
    exhaustive: bool,
    branching: Branching,
}

impl Default for Searcher {
    fn default() -> Self {
        Self {
            tt: Tt::new(),
            nodes: 0,
            node_limit: u64::MAX,
            deadline: None,
            abort: None,
            truncated: false,
            root: Player::First,
            use_tt: false,
            exhaustive: false,
            branching: Branching::GameDefault,
        }
    }
}

impl Searcher {
    /// Searcher that gives up as soon as `flag` is raised.
    pub fn with_abort(flag: Arc<AtomicBool>) -> Self {
        Self { abort: Some(flag), ..Self::default() }
    }

    pub fn nodes(&self) -> u64 { self.nodes }

    pub fn tt_len(&self) -> usize { self.tt.len() }

    pub fn tt_probe<G: Game>(&self, board: &G, depth: u32, side: Player) -> Option<Entry> {
        self.tt.get(board.signature(), depth, side)
    }

    fn configure(&mut self, params: &SearchParams) {
        self.nodes = 0;
        self.node_limit = params.max_nodes.unwrap_or(u64::MAX);
        self.deadline = params.movetime.map(|d| Instant::now() + d);
        self.use_tt = params.use_tt;
        self.tt = if params.use_tt { Tt::with_capacity_entries(params.tt_entries) } else { Tt::new() };
        self.exhaustive = params.exhaustive;
        self.branching = params.branching;
        self.truncated = false;
    }

    fn out_of_budget(&self) -> bool {
        if let Some(ref flag) = self.abort { if flag.load(Ordering::Relaxed) { return true; } }
        if self.nodes >= self.node_limit { return true; }
        if let Some(dl) = self.deadline { if Instant::now() >= dl { return true; } }
        false
    }

    /// One standalone search from `board` with `player` as the maximizing
    /// side. Starts from an empty table and no node or time budget (the
    /// abort flag still applies); table on/off, pruning and branching keep
    /// the last configuration. Returns the best root move (if any candidate
    /// was examined) and its value.
    pub fn search<G: Game>(&mut self, board: &G, player: Player, depth: u32, alpha: i32, beta: i32, maximizing: bool) -> Node {
        self.nodes = 0;
        self.node_limit = u64::MAX;
        self.deadline = None;
        self.tt.clear();
        self.root_search(board, player, depth, alpha, beta, maximizing)
    }

    // One iteration under the current budgets; the table carries over.
    fn root_search<G: Game>(&mut self, board: &G, player: Player, depth: u32, alpha: i32, beta: i32, maximizing: bool) -> Node {
        self.root = player;
        self.truncated = false;
        self.node(board, depth, 0, alpha, beta, maximizing)
    }

    /// Whether the most recent search was cut short.
    pub fn was_truncated(&self) -> bool { self.truncated }

    fn node<G: Game>(&mut self, board: &G, depth: u32, ply: i32, mut alpha: i32, mut beta: i32, maximizing: bool) -> Node {
        self.nodes += 1;
        if self.out_of_budget() {
            self.truncated = true;
            return Node::leaf(board.evaluate(self.root));
        }
        if let Some(w) = board.terminal_winner() {
            // Sooner wins score higher, later losses lower
            return Node::leaf(if w == self.root { WIN_SCORE - ply } else { -WIN_SCORE + ply });
        }
        if depth == 0 { return Node::leaf(board.evaluate(self.root)); }

        let side = if maximizing { self.root } else { self.root.opponent() };
        let key = if self.use_tt { Some(board.signature()) } else { None };
        if let Some(k) = key {
            if let Some(en) = self.tt.get(k, depth, side) {
                let score = score_from_tt(en.score, ply);
                match en.bound {
                    Bound::Exact => return Node::leaf(score),
                    Bound::Lower => if score >= beta { return Node::leaf(score); },
                    Bound::Upper => if score <= alpha { return Node::leaf(score); },
                }
            }
        }

        let moves = board.legal_moves(side);
        if moves.is_empty() {
            if board.legal_moves(side.opponent()).is_empty() { return Node::leaf(board.evaluate(self.root)); }
            // Pass: the opponent moves again one ply down
            let reply = self.node(board, depth - 1, ply + 1, alpha, beta, !maximizing);
            return Node::leaf(reply.value);
        }
        let moves = order_moves(board, side, moves, self.branching.resolve(board));

        let (orig_alpha, orig_beta) = (alpha, beta);
        let mut best: Option<Pos> = None;
        let mut value = if maximizing { -INF } else { INF };
        for mv in moves {
            let mut child = board.clone();
            if child.apply_move(mv, side).is_err() { continue; }
            let reply = self.node(&child, depth - 1, ply + 1, alpha, beta, !maximizing);
            if maximizing {
                if best.is_none() || reply.value > value { value = reply.value; best = Some(mv); }
                alpha = alpha.max(value);
            } else {
                if best.is_none() || reply.value < value { value = reply.value; best = Some(mv); }
                beta = beta.min(value);
            }
            if !self.exhaustive && alpha >= beta { break; }
            if self.out_of_budget() { self.truncated = true; break; }
        }
        if best.is_none() { return Node::leaf(board.evaluate(self.root)); }

        if let Some(k) = key {
            if !self.truncated {
                let bound = if value <= orig_alpha { Bound::Upper } else if value >= orig_beta { Bound::Lower } else { Bound::Exact };
                self.tt.put(Entry { key: k, depth, side, score: score_to_tt(value, ply), bound });
            }
        }
        Node { best, value }
    }

    /// Top-level entry: sets budgets, picks the depth, optionally deepens
    /// iteratively. A truncated iteration never replaces the result of a
    /// completed one; it is used only when nothing completed at all.
    pub fn search_with_params<G: Game>(&mut self, board: &G, player: Player, params: SearchParams) -> SearchResult {
        let start = Instant::now();
        self.configure(&params);
        let policy = params.depth_policy.unwrap_or_else(G::default_depth_policy);
        let target = if params.depth > 0 { params.depth } else { board.suggested_depth(&policy) };
        let first = if params.iterative { 1 } else { target };

        let mut result = SearchResult { score: board.evaluate(player), ..SearchResult::default() };
        let mut partial: Option<Node> = None;
        for d in first..=target {
            let n = self.root_search(board, player, d, -INF, INF, true);
            if self.truncated {
                result.timed_out = true;
                if n.best.is_some() { partial = Some(n); }
                debug!("{} depth {d} cut short after {} nodes", G::NAME, self.nodes);
                break;
            }
            result.best_move = n.best;
            result.score = n.value;
            result.depth = d;
            debug!("{} depth {d}: best {:?} score {} nodes {}", G::NAME, n.best, n.value, self.nodes);
            if n.value.abs() >= WIN_THRESHOLD { break; }
        }
        if result.best_move.is_none() {
            if let Some(p) = partial {
                result.best_move = p.best;
                result.score = p.value;
            }
        }
        result.nodes = self.nodes;
        result.elapsed_ms = start.elapsed().as_millis() as u64;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CascadeBoard, FlipBoard};

    #[test]
    fn depth_one_returns_a_legal_move() {
        let b = FlipBoard::new();
        let mut s = Searcher::default();
        let mut p = SearchParams::default();
        p.depth = 1;
        let r = s.search_with_params(&b, Player::First, p);
        let mv = r.best_move.expect("a move at depth 1");
        assert!(b.legal_moves(Player::First).contains(&mv));
        assert_eq!(r.depth, 1);
        assert!(!r.timed_out);
    }

    #[test]
    fn takes_the_immediate_win() {
        // Overflowing a1 converts b1, the only cell the second player owns.
        let b = CascadeBoard::from_layout(&[
            "1a 1b .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  1a",
        ]).unwrap();
        let mut s = Searcher::default();
        let mut p = SearchParams::default();
        p.depth = 2;
        let r = s.search_with_params(&b, Player::First, p);
        assert_eq!(r.best_move, Some(Pos::new(0, 0)));
        assert_eq!(r.score, WIN_SCORE - 1);
    }

    #[test]
    fn immediate_win_beats_a_higher_ranked_move() {
        // c3 ranks first (one short of bursting) but only a1 wins on the spot.
        let b = CascadeBoard::from_layout(&[
            "1a 1b .  .  .",
            ".  .  .  .  .",
            ".  .  3a .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
        ]).unwrap();
        assert!(b.move_priority(Pos::new(2, 2), Player::First) > b.move_priority(Pos::new(0, 0), Player::First));
        let mut s = Searcher::default();
        let mut p = SearchParams::default();
        p.depth = 3;
        let r = s.search_with_params(&b, Player::First, p);
        assert_eq!(r.best_move, Some(Pos::new(0, 0)));
        assert_eq!(r.score, WIN_SCORE - 1);
    }

    #[test]
    fn standalone_search_ignores_earlier_state() {
        let b = FlipBoard::new();
        let mut reused = Searcher::default();
        let mut p = SearchParams::default();
        p.depth = 4; p.use_tt = true; p.max_nodes = Some(5_000);
        reused.search_with_params(&b, Player::First, p);
        for mv in b.legal_moves(Player::First) {
            let mut child = b.clone();
            child.apply_move(mv, Player::First).unwrap();
            let fresh = Searcher::default().search(&child, Player::Second, 3, -INF, INF, true);
            let again = reused.search(&child, Player::Second, 3, -INF, INF, true);
            assert_eq!(again.value, fresh.value, "{mv}: value leaked from the earlier search");
            assert!(!reused.was_truncated());
        }
    }

    #[test]
    fn zero_depth_budget_uses_policy() {
        let b = CascadeBoard::new();
        let mut s = Searcher::default();
        let r = s.search_with_params(&b, Player::First, SearchParams::default());
        assert_eq!(r.depth, CascadeBoard::default_depth_policy().opening);
    }
}
