use log::warn;
use serde::Serialize;

use super::{BranchLimit, DepthPolicy, Game, Phase};
use crate::board::{CascadeBoard, Player, Pos};
use crate::error::GameError;
use crate::search::{eval, zobrist};

/// Trace of one resolved placement: the cells that discharged together in
/// each propagation wave.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Cascade {
    pub generations: Vec<Vec<Pos>>,
    /// The generation cap stopped propagation before the board settled.
    pub truncated: bool,
}

impl Cascade {
    pub fn len(&self) -> usize { self.generations.len() }

    pub fn is_empty(&self) -> bool { self.generations.is_empty() }

    /// Total number of discharges over all generations.
    pub fn discharges(&self) -> usize { self.generations.iter().map(Vec::len).sum() }

    pub fn guard_tripped(&self) -> Option<GameError> {
        self.truncated.then(|| GameError::CascadeOverflowGuardTripped { generations: self.generations.len() })
    }
}

/// Place one unit at `origin` for `player` and discharge every overflowing
/// cell, wave by wave, until the board is stable or the board's generation
/// cap is reached. A rejected placement leaves the board untouched.
pub fn resolve(board: &mut CascadeBoard, origin: Pos, player: Player) -> Result<Cascade, GameError> {
    board.place(origin, player)?;
    let cap = board.generation_cap();
    let mut out = Cascade::default();
    let mut frontier = vec![origin];
    let mut waves = 0usize;
    while !frontier.is_empty() {
        if waves >= cap {
            out.truncated = true;
            warn!("cascade from {origin} hit the {cap}-generation cap; keeping board as-is");
            break;
        }
        waves += 1;
        let current: Vec<Pos> = frontier.iter().copied().filter(|&p| board.is_overflowing(p)).collect();
        let mut next: Vec<Pos> = Vec::new();
        for &p in &current {
            let Some(owner) = board.clear(p) else { continue };
            let around: Vec<Pos> = board.neighbors(p).collect();
            for n in around {
                board.add_unit(n, owner);
                if board.is_overflowing(n) && !next.contains(&n) { next.push(n); }
            }
        }
        if !current.is_empty() { out.generations.push(current); }
        frontier = next;
    }
    Ok(out)
}

impl Game for CascadeBoard {
    type Effect = Cascade;

    const NAME: &'static str = "cascade";

    fn legal_moves(&self, player: Player) -> Vec<Pos> {
        self.positions()
            .filter(|&p| self.cell(p).is_some_and(|c| c.occupant.is_none() || c.occupant == Some(player)))
            .collect()
    }

    fn apply_move(&mut self, mv: Pos, player: Player) -> Result<Cascade, GameError> { resolve(self, mv, player) }

    /// Undefined until both sides have placed; afterwards a side with no
    /// units left loses as long as the other still has some.
    fn terminal_winner(&self) -> Option<Player> {
        if !self.has_moved(Player::First) || !self.has_moved(Player::Second) { return None; }
        let first = self.units_of(Player::First);
        let second = self.units_of(Player::Second);
        match (first, second) {
            (0, s) if s > 0 => Some(Player::Second),
            (f, 0) if f > 0 => Some(Player::First),
            _ => None,
        }
    }

    fn evaluate(&self, perspective: Player) -> i32 { eval::cascade_score(self, perspective) }

    /// Prefer stacking: fuller cells first, cells one unit from discharging
    /// strongly first.
    fn move_priority(&self, mv: Pos, _player: Player) -> i32 {
        match self.cell(mv) {
            Some(c) => {
                let mut score = c.count as i32 * 10;
                // One unit short of bursting, including empty capacity-1 cells.
                if c.count + 1 == c.capacity { score += 50; }
                score
            }
            None => i32::MIN / 2,
        }
    }

    fn default_branch_limit(&self) -> Option<BranchLimit> { Some(BranchLimit { threshold: 8, cap: 6 }) }

    fn signature(&self) -> u64 { zobrist::cascade_key(self) }

    /// Busy boards make every cascade expensive, so the phase tracks unit
    /// and cell counts rather than move number.
    fn phase(&self) -> Phase {
        let units = self.total_units();
        let cells = self.occupied();
        if units > 20 || cells > 16 {
            Phase::Late
        } else if units > 12 || cells > 10 {
            Phase::Middle
        } else if units < 6 {
            Phase::Opening
        } else {
            Phase::Middle
        }
    }

    fn default_depth_policy() -> DepthPolicy { DepthPolicy { opening: 3, middle: 2, late: 1 } }

    fn dims(&self) -> (u8, u8) { CascadeBoard::dims(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_placement_on_empty_cell_has_no_generations() {
        let mut b = CascadeBoard::new();
        let c = resolve(&mut b, Pos::new(2, 2), Player::First).unwrap();
        assert!(c.is_empty());
        assert_eq!(b.units_of(Player::First), 1);
    }

    #[test]
    fn discharge_converts_neighbors() {
        let mut b = CascadeBoard::from_layout(&[
            "1a 1b .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
        ]).unwrap();
        let c = resolve(&mut b, Pos::new(0, 0), Player::First).unwrap();
        assert_eq!(c.generations, vec![vec![Pos::new(0, 0)]]);
        let taken = b.cell(Pos::new(0, 1)).unwrap();
        assert_eq!((taken.occupant, taken.count), (Some(Player::First), 2));
        assert_eq!(b.units_of(Player::Second), 0);
        assert_eq!(b.terminal_winner(), Some(Player::First));
    }

    #[test]
    fn chain_runs_multiple_generations() {
        // a1 overflows into b1 (cap 3, holds 2) which then overflows too.
        let mut b = CascadeBoard::from_layout(&[
            "1a 2b .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
        ]).unwrap();
        let c = resolve(&mut b, Pos::new(0, 0), Player::First).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.generations[1], vec![Pos::new(0, 1)]);
        assert!(!c.truncated);
        assert_eq!(b.units_of(Player::Second), 0);
    }

    #[test]
    fn capacity_one_board_trips_guard_and_stops() {
        let mut b = CascadeBoard::with_uniform_capacity(3, 3, 1).with_generation_cap(16);
        let c = resolve(&mut b, Pos::new(1, 1), Player::First).unwrap();
        assert!(c.truncated);
        assert_eq!(c.len(), 16);
        assert_eq!(c.guard_tripped(), Some(GameError::CascadeOverflowGuardTripped { generations: 16 }));
    }

    #[test]
    fn rejected_placement_yields_nothing() {
        let mut b = CascadeBoard::from_layout(&["1b .", ". ."]).unwrap();
        let before = b.clone();
        assert!(resolve(&mut b, Pos::new(0, 0), Player::First).is_err());
        assert_eq!(b, before);
    }

    #[test]
    fn winner_undefined_until_both_moved() {
        let mut b = CascadeBoard::new();
        b.apply_move(Pos::new(0, 0), Player::First).unwrap();
        assert_eq!(b.terminal_winner(), None, "second player has not moved yet");
    }

    #[test]
    fn priority_prefers_near_overflow() {
        let b = CascadeBoard::from_layout(&[
            "1a .  .  .  .",
            ".  2a .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
        ]).unwrap();
        let corner = b.move_priority(Pos::new(0, 0), Player::First);
        let inner = b.move_priority(Pos::new(1, 1), Player::First);
        let empty = b.move_priority(Pos::new(4, 4), Player::First);
        assert_eq!(corner, 60);
        assert_eq!(inner, 20);
        assert_eq!(empty, 0);
    }

    #[test]
    fn empty_unit_capacity_cell_counts_as_near_overflow() {
        let b = CascadeBoard::with_uniform_capacity(3, 3, 1);
        assert_eq!(b.move_priority(Pos::new(1, 1), Player::First), 50);
        let roomy = CascadeBoard::with_uniform_capacity(3, 3, 3);
        assert_eq!(roomy.move_priority(Pos::new(1, 1), Player::First), 0);
    }

    #[test]
    fn phase_tracks_occupancy() {
        assert_eq!(CascadeBoard::new().phase(), Phase::Opening);
        let busy = CascadeBoard::from_layout(&[
            "1a 2a 2a 2a 1a",
            "2b 3b 3b 3b 2b",
            "1a 1a .  .  .",
            ".  .  .  .  .",
            ".  .  .  .  .",
        ]).unwrap();
        assert_eq!(busy.phase(), Phase::Late);
    }
}
