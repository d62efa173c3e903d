//! Board model shared by both games: players, coordinates and the two grid
//! representations.

pub mod cascade;
pub mod flip;

pub use cascade::{CascadeBoard, Cell};
pub use flip::FlipBoard;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// One of the two sides. `First` always opens the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    First,
    Second,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::First, Player::Second];

    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::First => write!(f, "first"),
            Player::Second => write!(f, "second"),
        }
    }
}

/// Zero-based cell coordinate. Printed in algebraic form: the column is a
/// letter, the row a 1-based number (`a1` is the top-left cell).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: u8,
    pub col: u8,
}

impl Pos {
    pub const fn new(row: u8, col: u8) -> Self { Self { row, col } }

    /// Step by a signed offset, staying inside a `rows × cols` grid.
    pub fn offset(self, dr: i8, dc: i8, rows: u8, cols: u8) -> Option<Pos> {
        let r = self.row as i16 + dr as i16;
        let c = self.col as i16 + dc as i16;
        if r < 0 || c < 0 || r >= rows as i16 || c >= cols as i16 { return None; }
        Some(Pos::new(r as u8, c as u8))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row as u32 + 1)
    }
}

impl FromStr for Pos {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let mut chars = s.chars();
        let file = chars.next().ok_or(ParseError::EmptyCoordinate)?;
        if !file.is_ascii_lowercase() { return Err(ParseError::BadColumn(s)); }
        let rank: u8 = chars.as_str().parse().map_err(|_| ParseError::BadRow(s.clone()))?;
        if rank == 0 { return Err(ParseError::BadRow(s)); }
        Ok(Pos::new(rank - 1, file as u8 - b'a'))
    }
}

/// Largest grid side: columns are named `a`..=`z`.
pub const MAX_SIDE: u8 = 26;

/// Orthogonal neighbour offsets (cascade discharge).
pub const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// The 8 compass directions (flip rays).
pub const COMPASS: [(i8, i8); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];

/// The four corner cells of a `rows × cols` grid.
pub fn corners(rows: u8, cols: u8) -> [Pos; 4] {
    [Pos::new(0, 0), Pos::new(0, cols - 1), Pos::new(rows - 1, 0), Pos::new(rows - 1, cols - 1)]
}
