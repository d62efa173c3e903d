use super::{DepthPolicy, Game, Phase};
use crate::board::{FlipBoard, Player, Pos, COMPASS};
use crate::error::GameError;
use crate::search::{eval, zobrist};

const N: u8 = FlipBoard::SIZE;

/// Opponent stones captured by `player` playing `pos`, ray by ray. Empty when
/// the cell is taken or no ray is bracketed.
pub fn captures(board: &FlipBoard, pos: Pos, player: Player) -> Vec<Pos> {
    let mut out = Vec::new();
    if !board.in_bounds(pos) || board.get(pos).is_some() { return out; }
    let opp = player.opponent();
    for &(dr, dc) in &COMPASS {
        let mut run = Vec::new();
        let mut cur = pos.offset(dr, dc, N, N);
        while let Some(p) = cur {
            if board.get(p) != Some(opp) { break; }
            run.push(p);
            cur = p.offset(dr, dc, N, N);
        }
        if !run.is_empty() && cur.is_some_and(|p| board.get(p) == Some(player)) {
            out.extend(run);
        }
    }
    out
}

fn brackets_any(board: &FlipBoard, pos: Pos, player: Player) -> bool {
    if board.get(pos).is_some() { return false; }
    let opp = player.opponent();
    COMPASS.iter().any(|&(dr, dc)| {
        let mut seen = false;
        let mut cur = pos.offset(dr, dc, N, N);
        while let Some(p) = cur {
            match board.get(p) {
                Some(o) if o == opp => seen = true,
                Some(_) => return seen,
                None => return false,
            }
            cur = p.offset(dr, dc, N, N);
        }
        false
    })
}

pub fn has_move(board: &FlipBoard, player: Player) -> bool {
    board.positions().any(|p| brackets_any(board, p, player))
}

impl Game for FlipBoard {
    type Effect = Vec<Pos>;

    const NAME: &'static str = "flip";

    fn legal_moves(&self, player: Player) -> Vec<Pos> {
        self.positions().filter(|&p| brackets_any(self, p, player)).collect()
    }

    fn apply_move(&mut self, mv: Pos, player: Player) -> Result<Vec<Pos>, GameError> {
        if !self.in_bounds(mv) { return Err(GameError::InvalidMove { pos: mv, reason: "off the board" }); }
        if self.get(mv).is_some() { return Err(GameError::InvalidMove { pos: mv, reason: "cell is taken" }); }
        let flipped = captures(self, mv, player);
        if flipped.is_empty() { return Err(GameError::InvalidMove { pos: mv, reason: "captures nothing" }); }
        self.flip(mv, player);
        for &p in &flipped { self.flip(p, player); }
        Ok(flipped)
    }

    fn terminal_winner(&self) -> Option<Player> {
        if !self.is_over() { return None; }
        let first = self.stones_of(Player::First);
        let second = self.stones_of(Player::Second);
        if first > second {
            Some(Player::First)
        } else if second > first {
            Some(Player::Second)
        } else {
            None
        }
    }

    fn is_over(&self) -> bool { !has_move(self, Player::First) && !has_move(self, Player::Second) }

    fn evaluate(&self, perspective: Player) -> i32 { eval::flip_score(self, perspective) }

    /// Corners first, then by distance from the centre of the board.
    fn move_priority(&self, mv: Pos, _player: Player) -> i32 {
        if self.corners().contains(&mv) { return 100; }
        // doubled coordinates keep the 3.5 centre integral
        let centre = (N - 1) as i32;
        -((2 * mv.row as i32 - centre).abs() + (2 * mv.col as i32 - centre).abs())
    }

    fn signature(&self) -> u64 { zobrist::flip_key(self) }

    fn phase(&self) -> Phase {
        let filled = self.occupied() as f32 / (N as f32 * N as f32);
        if filled < 0.35 {
            Phase::Opening
        } else if filled < 0.70 {
            Phase::Middle
        } else {
            Phase::Late
        }
    }

    fn default_depth_policy() -> DepthPolicy { DepthPolicy { opening: 2, middle: 3, late: 4 } }

    fn dims(&self) -> (u8, u8) { FlipBoard::dims(self) }
}
