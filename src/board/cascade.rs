use std::fmt;

use super::{corners, Player, Pos, MAX_SIDE, ORTHOGONAL};
use crate::error::{GameError, ParseError};

/// Safety ceiling on propagation waves. Not a game rule: it only guarantees
/// that resolution returns on boards that would otherwise ping-pong forever.
pub const DEFAULT_GENERATION_CAP: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub occupant: Option<Player>,
    pub count: u8,
    pub capacity: u8,
}

impl Cell {
    fn new(capacity: u8) -> Self { Self { occupant: None, count: 0, capacity } }

    pub fn is_empty(&self) -> bool { self.count == 0 }

    pub fn is_overflowing(&self) -> bool { self.count >= self.capacity }
}

/// Chain-reaction board. Cells hold units up to a capacity derived from
/// their position; the board also remembers which players have placed at
/// least once, since an opening board has no defined winner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CascadeBoard {
    rows: u8,
    cols: u8,
    cells: Vec<Cell>,
    moved: [bool; 2],
    generation_cap: usize,
}

impl Default for CascadeBoard {
    fn default() -> Self { Self::new() }
}

impl CascadeBoard {
    pub const ROWS: u8 = 5;
    pub const COLS: u8 = 5;

    /// Empty 5×5 board.
    pub fn new() -> Self { Self::with_size(Self::ROWS, Self::COLS) }

    /// Empty board with positional capacities (corner 2, edge 3, interior 4).
    /// Sides are clamped to `2..=MAX_SIDE`.
    pub fn with_size(rows: u8, cols: u8) -> Self {
        let (rows, cols) = (rows.clamp(2, MAX_SIDE), cols.clamp(2, MAX_SIDE));
        let mut cells = Vec::with_capacity(rows as usize * cols as usize);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(Cell::new(Self::positional_capacity(rows, cols, Pos::new(r, c))));
            }
        }
        Self { rows, cols, cells, moved: [false; 2], generation_cap: DEFAULT_GENERATION_CAP }
    }

    /// Empty board where every cell shares one capacity (small synthetic boards).
    pub fn with_uniform_capacity(rows: u8, cols: u8, capacity: u8) -> Self {
        let mut b = Self::with_size(rows, cols);
        for cell in &mut b.cells { cell.capacity = capacity.max(1); }
        b
    }

    pub fn with_generation_cap(mut self, cap: usize) -> Self {
        self.generation_cap = cap.max(1);
        self
    }

    /// Parse a layout such as `["1a . .", ". 2b .", ". . ."]`: `.` is empty,
    /// `<count><a|b>` is a cell owned by the first or second player. Players
    /// present on the board are marked as having moved.
    pub fn from_layout(lines: &[&str]) -> Result<Self, ParseError> {
        let rows = lines.len();
        let cols = lines.first().map(|l| l.split_whitespace().count()).unwrap_or(0);
        let side = 2..=MAX_SIDE as usize;
        if !side.contains(&rows) || !side.contains(&cols) { return Err(ParseError::BadSize { rows, cols }); }
        let mut b = Self::with_size(rows as u8, cols as u8);
        for (r, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != cols { return Err(ParseError::RowLength { row: r + 1, found: tokens.len(), expected: cols }); }
            for (c, tok) in tokens.iter().enumerate() {
                if *tok == "." { continue; }
                if !tok.is_ascii() || tok.len() < 2 { return Err(ParseError::BadCell(tok.to_string())); }
                let (num, owner) = tok.split_at(tok.len() - 1);
                let player = match owner {
                    "a" => Player::First,
                    "b" => Player::Second,
                    _ => return Err(ParseError::BadCell(tok.to_string())),
                };
                let count: u8 = num.parse().map_err(|_| ParseError::BadCell(tok.to_string()))?;
                let idx = b.idx(Pos::new(r as u8, c as u8));
                if count == 0 || count >= b.cells[idx].capacity { return Err(ParseError::CountOutOfRange(tok.to_string())); }
                b.cells[idx].occupant = Some(player);
                b.cells[idx].count = count;
                b.moved[player.index()] = true;
            }
        }
        Ok(b)
    }

    /// Corner 2, edge 3, interior 4.
    pub fn positional_capacity(rows: u8, cols: u8, pos: Pos) -> u8 {
        let row_edge = pos.row == 0 || pos.row == rows - 1;
        let col_edge = pos.col == 0 || pos.col == cols - 1;
        match (row_edge, col_edge) {
            (true, true) => 2,
            (true, false) | (false, true) => 3,
            (false, false) => 4,
        }
    }

    pub fn dims(&self) -> (u8, u8) { (self.rows, self.cols) }

    pub fn generation_cap(&self) -> usize { self.generation_cap }

    pub fn in_bounds(&self, pos: Pos) -> bool { pos.row < self.rows && pos.col < self.cols }

    fn idx(&self, pos: Pos) -> usize { pos.row as usize * self.cols as usize + pos.col as usize }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        if !self.in_bounds(pos) { return None; }
        Some(&self.cells[self.idx(pos)])
    }

    pub fn capacity_at(&self, pos: Pos) -> u8 { self.cell(pos).map_or(0, |c| c.capacity) }

    pub fn is_overflowing(&self, pos: Pos) -> bool { self.cell(pos).is_some_and(Cell::is_overflowing) }

    /// Add one unit for `player`. Rejected (board untouched) when the cell is
    /// off the board or owned by the opponent. Does not resolve overflow.
    pub fn place(&mut self, pos: Pos, player: Player) -> Result<(), GameError> {
        let cell = self.cell(pos).ok_or(GameError::InvalidMove { pos, reason: "off the board" })?;
        if cell.occupant == Some(player.opponent()) {
            return Err(GameError::InvalidMove { pos, reason: "occupied by opponent" });
        }
        self.moved[player.index()] = true;
        self.add_unit(pos, player);
        Ok(())
    }

    /// Unconditional unit transfer: the cell gains one unit and now belongs
    /// to `player`. Out-of-bounds positions are ignored.
    pub fn add_unit(&mut self, pos: Pos, player: Player) {
        if !self.in_bounds(pos) { return; }
        let i = self.idx(pos);
        let cell = &mut self.cells[i];
        cell.count = cell.count.saturating_add(1);
        cell.occupant = Some(player);
    }

    /// Empty the cell and return whoever owned it.
    pub fn clear(&mut self, pos: Pos) -> Option<Player> {
        if !self.in_bounds(pos) { return None; }
        let i = self.idx(pos);
        let owner = self.cells[i].occupant.take();
        self.cells[i].count = 0;
        owner
    }

    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        ORTHOGONAL.iter().filter_map(move |&(dr, dc)| pos.offset(dr, dc, self.rows, self.cols))
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        let cols = self.cols;
        (0..self.rows).flat_map(move |r| (0..cols).map(move |c| Pos::new(r, c)))
    }

    pub fn corners(&self) -> [Pos; 4] { corners(self.rows, self.cols) }

    pub fn has_moved(&self, player: Player) -> bool { self.moved[player.index()] }

    /// Total units owned by `player`.
    pub fn units_of(&self, player: Player) -> u32 {
        self.cells.iter().filter(|c| c.occupant == Some(player)).map(|c| c.count as u32).sum()
    }

    /// Number of cells owned by `player`.
    pub fn cells_of(&self, player: Player) -> u32 {
        self.cells.iter().filter(|c| c.occupant == Some(player)).count() as u32
    }

    pub fn total_units(&self) -> u32 { self.cells.iter().map(|c| c.count as u32).sum() }

    pub fn occupied(&self) -> u32 { self.cells.iter().filter(|c| c.occupant.is_some()).count() as u32 }
}

impl fmt::Display for CascadeBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for c in 0..self.cols { write!(f, " {} ", (b'a' + c) as char)?; }
        writeln!(f)?;
        for r in 0..self.rows {
            write!(f, "{:>2} ", r + 1)?;
            for c in 0..self.cols {
                let cell = &self.cells[self.idx(Pos::new(r, c))];
                match cell.occupant {
                    None => write!(f, " . ")?,
                    Some(Player::First) => write!(f, "{:>2}A", cell.count)?,
                    Some(Player::Second) => write!(f, "{:>2}B", cell.count)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
