use std::fmt;

use super::{corners, Player, Pos};
use crate::error::ParseError;

/// Othello board: 8×8, each cell empty or holding one player's stone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlipBoard {
    cells: [[Option<Player>; 8]; 8],
}

impl Default for FlipBoard {
    fn default() -> Self { Self::new() }
}

impl FlipBoard {
    pub const SIZE: u8 = 8;

    /// Standard start: two stones each in the centre, `First` (black) on
    /// d5/e4, `Second` (white) on d4/e5.
    pub fn new() -> Self {
        let mut b = Self::empty();
        let m = Self::SIZE / 2;
        b.flip(Pos::new(m - 1, m - 1), Player::Second);
        b.flip(Pos::new(m, m), Player::Second);
        b.flip(Pos::new(m - 1, m), Player::First);
        b.flip(Pos::new(m, m - 1), Player::First);
        b
    }

    pub fn empty() -> Self { Self { cells: [[None; 8]; 8] } }

    /// Parse 8 lines of `.`, `X` (first) and `O` (second); whitespace is ignored.
    pub fn from_layout(lines: &[&str]) -> Result<Self, ParseError> {
        let n = Self::SIZE as usize;
        if lines.len() != n { return Err(ParseError::BadSize { rows: lines.len(), cols: n }); }
        let mut b = Self::empty();
        for (r, line) in lines.iter().enumerate() {
            let row: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if row.len() != n { return Err(ParseError::RowLength { row: r + 1, found: row.len(), expected: n }); }
            for (c, ch) in row.into_iter().enumerate() {
                let pos = Pos::new(r as u8, c as u8);
                match ch {
                    '.' => {}
                    'X' | 'x' => b.flip(pos, Player::First),
                    'O' | 'o' => b.flip(pos, Player::Second),
                    other => return Err(ParseError::BadCell(other.to_string())),
                }
            }
        }
        Ok(b)
    }

    pub fn dims(&self) -> (u8, u8) { (Self::SIZE, Self::SIZE) }

    pub fn in_bounds(&self, pos: Pos) -> bool { pos.row < Self::SIZE && pos.col < Self::SIZE }

    pub fn get(&self, pos: Pos) -> Option<Player> {
        if !self.in_bounds(pos) { return None; }
        self.cells[pos.row as usize][pos.col as usize]
    }

    /// Set the occupant unconditionally.
    pub fn flip(&mut self, pos: Pos, player: Player) {
        if self.in_bounds(pos) { self.cells[pos.row as usize][pos.col as usize] = Some(player); }
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        (0..Self::SIZE).flat_map(|r| (0..Self::SIZE).map(move |c| Pos::new(r, c)))
    }

    pub fn corners(&self) -> [Pos; 4] { corners(Self::SIZE, Self::SIZE) }

    pub fn stones_of(&self, player: Player) -> u32 {
        self.cells.iter().flatten().filter(|c| **c == Some(player)).count() as u32
    }

    pub fn occupied(&self) -> u32 { self.cells.iter().flatten().filter(|c| c.is_some()).count() as u32 }

    pub fn empty_cells(&self) -> u32 { (Self::SIZE as u32 * Self::SIZE as u32) - self.occupied() }
}

impl fmt::Display for FlipBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for c in 0..Self::SIZE { write!(f, " {}", (b'a' + c) as char)?; }
        writeln!(f)?;
        for r in 0..Self::SIZE {
            write!(f, "{} ", r + 1)?;
            for c in 0..Self::SIZE {
                let ch = match self.cells[r as usize][c as usize] {
                    None => '.',
                    Some(Player::First) => 'X',
                    Some(Player::Second) => 'O',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_has_two_each() {
        let b = FlipBoard::new();
        assert_eq!(b.stones_of(Player::First), 2);
        assert_eq!(b.stones_of(Player::Second), 2);
        assert_eq!(b.empty_cells(), 60);
        assert_eq!(b.get(Pos::new(3, 3)), Some(Player::Second));
        assert_eq!(b.get(Pos::new(3, 4)), Some(Player::First));
    }

    #[test]
    fn layout_matches_start() {
        let b = FlipBoard::from_layout(&[
            "........", "........", "........", "...OX...",
            "...XO...", "........", "........", "........",
        ]).unwrap();
        assert_eq!(b, FlipBoard::new());
    }
}
