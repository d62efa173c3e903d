use std::sync::OnceLock;

use crate::board::{CascadeBoard, FlipBoard, Player, Pos};

// Largest grid the tables cover and the largest per-cell unit count keyed
// individually; counts above it share the last slot.
const MAX_SIDE: usize = crate::board::MAX_SIDE as usize;
const MAX_COUNT: usize = 8;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

const TABLE_LEN: usize = 2 * MAX_COUNT * MAX_SIDE * MAX_SIDE;

static TABLE: OnceLock<Vec<u64>> = OnceLock::new();
static MOVED_KEYS: OnceLock<[u64; 2]> = OnceLock::new();

fn init_table() -> &'static [u64] {
    TABLE.get_or_init(|| {
        let mut t = vec![0u64; TABLE_LEN];
        let mut seed = 0xF00D_F00D_DEAD_BEEF;
        for v in &mut t {
            seed = splitmix64(seed);
            *v = seed;
        }
        t
    })
}

fn moved_keys() -> &'static [u64; 2] {
    MOVED_KEYS.get_or_init(|| [splitmix64(0xABCDEF1234567890), splitmix64(0x1234567890ABCDEF)])
}

fn slot(player: Player, count: u8, pos: Pos) -> usize {
    let c = (count as usize).clamp(1, MAX_COUNT) - 1;
    let cell = pos.row as usize * MAX_SIDE + pos.col as usize;
    ((player.index() * MAX_COUNT + c) * MAX_SIDE * MAX_SIDE) + cell
}

/// Owner and unit count of every cell, plus the "has moved" flags (they
/// decide whether a winner exists, so they are part of the position).
pub fn cascade_key(board: &CascadeBoard) -> u64 {
    let table = init_table();
    let mut key = 0u64;
    for pos in board.positions() {
        if let Some(cell) = board.cell(pos) {
            if let Some(owner) = cell.occupant {
                key ^= table[slot(owner, cell.count, pos)];
            }
        }
    }
    for p in Player::BOTH {
        if board.has_moved(p) { key ^= moved_keys()[p.index()]; }
    }
    key
}

pub fn flip_key(board: &FlipBoard) -> u64 {
    let table = init_table();
    let mut key = 0u64;
    for pos in board.positions() {
        if let Some(owner) = board.get(pos) { key ^= table[slot(owner, 1, pos)]; }
    }
    key
}
