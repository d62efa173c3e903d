use crate::board::{CascadeBoard, FlipBoard, Player};
use crate::rules::Game;

// Cascade weights
const UNIT: i32 = 10;
const CELL: i32 = 15;
const CASCADE_CORNER: i32 = 20;

// Flip weights
const STONE: i32 = 10;
const FLIP_CORNER: i32 = 120;
const MOBILITY: i32 = 5;

// Decided-game scoring; far above anything the heuristics can reach.
pub const WIN_SCORE: i32 = 1_000_000;
pub const DRAW_SCORE: i32 = 0;

/// Scores at or beyond this magnitude mean a forced result was found.
pub const WIN_THRESHOLD: i32 = WIN_SCORE - 1_000;

fn decided(winner: Option<Player>, perspective: Player) -> Option<i32> {
    winner.map(|w| if w == perspective { WIN_SCORE } else { -WIN_SCORE })
}

// Sign of the owner of a cell relative to perspective.
fn side(owner: Option<Player>, perspective: Player) -> i32 {
    match owner {
        Some(p) if p == perspective => 1,
        Some(_) => -1,
        None => 0,
    }
}

pub fn cascade_score(board: &CascadeBoard, perspective: Player) -> i32 {
    if let Some(s) = decided(board.terminal_winner(), perspective) { return s; }
    let opp = perspective.opponent();
    let units = board.units_of(perspective) as i32 - board.units_of(opp) as i32;
    let cells = board.cells_of(perspective) as i32 - board.cells_of(opp) as i32;
    let corners: i32 = board.corners().iter()
        .map(|&c| side(board.cell(c).and_then(|cell| cell.occupant), perspective))
        .sum();
    units * UNIT + cells * CELL + corners * CASCADE_CORNER
}

pub fn flip_score(board: &FlipBoard, perspective: Player) -> i32 {
    let opp = perspective.opponent();
    let my_moves = board.legal_moves(perspective).len() as i32;
    let their_moves = board.legal_moves(opp).len() as i32;
    if my_moves == 0 && their_moves == 0 {
        return decided(board.terminal_winner(), perspective).unwrap_or(DRAW_SCORE);
    }
    let stones = board.stones_of(perspective) as i32 - board.stones_of(opp) as i32;
    let corners: i32 = board.corners().iter().map(|&c| side(board.get(c), perspective)).sum();
    stones * STONE + corners * FLIP_CORNER + (my_moves - their_moves) * MOBILITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Pos;

    #[test]
    fn start_positions_are_balanced() {
        assert_eq!(cascade_score(&CascadeBoard::new(), Player::First), 0);
        assert_eq!(flip_score(&FlipBoard::new(), Player::First), 0);
    }

    #[test]
    fn cascade_corner_biases_toward_owner() {
        let b = CascadeBoard::from_layout(&[
            "1a .  .  .  .",
            ".  .  .  .  .",
            ".  .  1b .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
        ]).unwrap();
        assert_eq!(cascade_score(&b, Player::First), CASCADE_CORNER);
        assert_eq!(cascade_score(&b, Player::Second), -CASCADE_CORNER);
    }

    #[test]
    fn cascade_win_dominates() {
        let b = CascadeBoard::from_layout(&["1a .", ". ."]).unwrap();
        // only one side has moved: undecided, heuristic applies
        assert!(cascade_score(&b, Player::First) < WIN_THRESHOLD);
        let mut b2 = CascadeBoard::from_layout(&["1a 1b", ". ."]).unwrap();
        b2.apply_move(Pos::new(0, 0), Player::First).unwrap();
        assert_eq!(cascade_score(&b2, Player::First), WIN_SCORE);
        assert_eq!(cascade_score(&b2, Player::Second), -WIN_SCORE);
    }

    #[test]
    fn flip_corner_biases_toward_owner() {
        let mut b = FlipBoard::new();
        b.flip(Pos::new(0, 0), Player::Second);
        assert!(flip_score(&b, Player::Second) > flip_score(&FlipBoard::new(), Player::Second));
        assert!(flip_score(&b, Player::First) < 0);
    }
}
