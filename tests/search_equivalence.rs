use gridwar::board::{Player, Pos};
use gridwar::rules::Game;
use gridwar::search::{Branching, SearchParams, SearchResult, Searcher, INF};
use gridwar::{CascadeBoard, FlipBoard};

fn params(depth: u32, exhaustive: bool) -> SearchParams {
    let mut p = SearchParams::default();
    p.depth = depth; p.use_tt = false; p.exhaustive = exhaustive; p.branching = Branching::Unlimited;
    p
}

fn run<G: Game>(b: &G, depth: u32, exhaustive: bool) -> SearchResult {
    Searcher::default().search_with_params(b, Player::First, params(depth, exhaustive))
}

/// The root move with the strictly highest minimax value, if there is one.
/// Child values sit one ply closer to the root, which shifts every win score
/// by the same amount and keeps the order.
fn unique_best<G: Game>(b: &G, depth: u32) -> Option<Pos> {
    let mut s = Searcher::default();
    s.search_with_params(b, Player::First, params(depth, true));
    let mut scored: Vec<(Pos, i32)> = Vec::new();
    for mv in b.legal_moves(Player::First) {
        let mut child = b.clone();
        if child.apply_move(mv, Player::First).is_err() { continue; }
        scored.push((mv, s.search(&child, Player::First, depth - 1, -INF, INF, false).value));
    }
    let top = scored.iter().map(|&(_, v)| v).max()?;
    let mut best = scored.iter().filter(|&&(_, v)| v == top);
    let first = best.next().map(|&(m, _)| m);
    if best.next().is_some() { None } else { first }
}

fn check<G: Game>(b: &G, depth: u32) {
    let ab = run(b, depth, false);
    let mm = run(b, depth, true);
    assert_eq!(ab.score, mm.score, "{} depth {depth}: pruning changed the value", G::NAME);
    assert!(ab.nodes <= mm.nodes, "alpha-beta visited {} nodes, minimax {}", ab.nodes, mm.nodes);
    assert!(!ab.timed_out && !mm.timed_out);
    if let Some(mv) = unique_best(b, depth) {
        assert_eq!(mm.best_move, Some(mv), "{} depth {depth}: minimax missed the best move", G::NAME);
        assert_eq!(ab.best_move, Some(mv), "{} depth {depth}: pruning changed the move", G::NAME);
    }
}

#[test]
fn small_cascade_boards_match_minimax() {
    let empty = CascadeBoard::with_size(3, 3);
    for d in 1..=4 { check(&empty, d); }
    let mid = CascadeBoard::from_layout(&[
        "1a .  1b",
        ".  3b .",
        "1a .  .",
    ]).unwrap();
    for d in 1..=4 { check(&mid, d); }
}

#[test]
fn flip_positions_match_minimax() {
    check(&FlipBoard::new(), 3);
    let late = FlipBoard::from_layout(&[
        "XXXXXXX.",
        "XXOOOOXX",
        "XOXOOXOX",
        "XOOXOXOX",
        "XOXOXOOX",
        "XOOOOXOX",
        "XXOOOOX.",
        "OXXXXX..",
    ]).unwrap();
    for d in 1..=4 { check(&late, d); }
}

#[test]
fn pruning_actually_saves_work() {
    let b = FlipBoard::new();
    let ab = run(&b, 4, false);
    let mm = run(&b, 4, true);
    assert!(ab.nodes < mm.nodes);
}

#[test]
fn unique_best_move_survives_pruning() {
    // Only a1 wins at once; every other move leaves the game open.
    let b = CascadeBoard::from_layout(&[
        "1a 1b .  .  .",
        ".  .  .  .  .",
        ".  .  3a .  .",
        ".  .  .  .  .",
        ".  .  .  .  .",
    ]).unwrap();
    for d in 1..=3 {
        assert_eq!(unique_best(&b, d), Some(Pos::new(0, 0)));
        check(&b, d);
    }
}
