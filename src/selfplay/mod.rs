use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::board::Player;
use crate::rules::Game;
use crate::search::noise::{choose_noisy_from_order, random_legal_move};
use crate::search::{SearchParams, Searcher};
use crate::worker::decide;

#[derive(Clone, Debug)]
pub struct SelfPlayParams {
    pub games: usize,
    pub max_plies: usize,
    pub threads: usize,
    /// false: both sides play uniformly random moves
    pub use_engine: bool,
    /// This side plays randomly even when the engine is on.
    pub random_side: Option<Player>,
    pub depth: u32,
    pub movetime_ms: Option<u64>,
    pub max_nodes: Option<u64>,
    pub seed: u64,
    pub opening_plies: usize, // first N plies drawn from the top-k ordered moves
    pub opening_topk: usize,
}

impl Default for SelfPlayParams {
    fn default() -> Self {
        Self {
            games: 10,
            max_plies: 200,
            threads: 1,
            use_engine: true,
            random_side: None,
            depth: 2,
            movetime_ms: None,
            max_nodes: Some(50_000),
            seed: 42,
            opening_plies: 2,
            opening_topk: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub moves: Vec<String>,
    pub winner: Option<Player>,
    pub plies: usize,
    pub passes: usize,
    /// Reached a natural end rather than the ply cap.
    pub finished: bool,
    /// Engine moves that came from the random fallback.
    pub fallbacks: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    pub game: String,
    pub games: usize,
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
    pub unfinished: usize,
    pub avg_plies: f64,
    pub fallbacks: usize,
}

fn engine_params(params: &SelfPlayParams) -> SearchParams {
    SearchParams {
        depth: params.depth,
        max_nodes: params.max_nodes,
        movetime: params.movetime_ms.map(Duration::from_millis),
        use_tt: true,
        iterative: true,
        ..SearchParams::default()
    }
}

/// Play one game from `start`. With no movetime the result depends only on
/// the seed and the game index.
pub fn play_game<G: Game>(start: &G, params: &SelfPlayParams, index: usize) -> GameRecord {
    let mut rng = SmallRng::seed_from_u64(params.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    let mut searcher = Searcher::default();
    let sp = engine_params(params);
    let mut board = start.clone();
    let mut to_move = Player::First;
    let mut record = GameRecord { moves: Vec::new(), winner: None, plies: 0, passes: 0, finished: false, fallbacks: 0 };
    let mut passes_in_row = 0;
    loop {
        if board.is_over() { record.finished = true; break; }
        if record.plies >= params.max_plies { break; }
        if board.legal_moves(to_move).is_empty() {
            record.passes += 1;
            passes_in_row += 1;
            if passes_in_row >= 2 { record.finished = true; break; }
            to_move = to_move.opponent();
            continue;
        }
        passes_in_row = 0;
        let mv = if record.plies < params.opening_plies {
            choose_noisy_from_order(&board, to_move, params.opening_topk, &mut rng)
        } else if !params.use_engine || params.random_side == Some(to_move) {
            random_legal_move(&board, to_move, &mut rng)
        } else {
            let d = decide(&mut searcher, &board, to_move, sp, &mut rng);
            if d.fallback { record.fallbacks += 1; }
            d.mv
        };
        let Some(mv) = mv else { break };
        if let Err(e) = board.apply_move(mv, to_move) {
            debug!("{}: game {index} stopped on {e}", G::NAME);
            break;
        }
        record.moves.push(mv.to_string());
        record.plies += 1;
        to_move = to_move.opponent();
    }
    record.winner = board.terminal_winner();
    record
}

pub fn generate_games<G: Game + Sync>(start: &G, params: &SelfPlayParams) -> Vec<GameRecord> {
    if params.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(params.threads).build();
        match pool {
            Ok(pool) => {
                return pool.install(|| (0..params.games).into_par_iter().map(|i| play_game(start, params, i)).collect());
            }
            Err(e) => log::warn!("thread pool unavailable ({e}), playing serially"),
        }
    }
    (0..params.games).map(|i| play_game(start, params, i)).collect()
}

pub fn summarize<G: Game>(games: &[GameRecord]) -> Summary {
    let mut s = Summary { game: G::NAME.to_string(), games: games.len(), ..Summary::default() };
    let mut plies = 0usize;
    for g in games {
        plies += g.plies;
        s.fallbacks += g.fallbacks;
        match (g.winner, g.finished) {
            (Some(Player::First), _) => s.first_wins += 1,
            (Some(Player::Second), _) => s.second_wins += 1,
            (None, true) => s.draws += 1,
            (None, false) => s.unfinished += 1,
        }
    }
    if !games.is_empty() { s.avg_plies = plies as f64 / games.len() as f64; }
    s
}

/// One JSON object per line.
pub fn write_records<P: AsRef<Path>>(games: &[GameRecord], out_dir: P) -> std::io::Result<PathBuf> {
    create_dir_all(&out_dir)?;
    let path = out_dir.as_ref().join("games.jsonl");
    let mut w = BufWriter::new(File::create(&path)?);
    for g in games {
        serde_json::to_writer(&mut w, g)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CascadeBoard, FlipBoard};

    fn quick() -> SelfPlayParams {
        SelfPlayParams { games: 3, max_plies: 12, depth: 1, max_nodes: Some(2_000), ..SelfPlayParams::default() }
    }

    #[test]
    fn same_seed_same_games() {
        let p = quick();
        let a = generate_games(&FlipBoard::new(), &p);
        let b = generate_games(&FlipBoard::new(), &p);
        assert_eq!(a, b);
        assert!(a.iter().all(|g| g.plies <= p.max_plies));
    }

    #[test]
    fn parallel_matches_serial() {
        let p = quick();
        let serial = generate_games(&CascadeBoard::new(), &p);
        let parallel = generate_games(&CascadeBoard::new(), &SelfPlayParams { threads: 2, ..p });
        assert_eq!(serial, parallel);
    }

    #[test]
    fn summary_counts_every_game() {
        let p = SelfPlayParams { use_engine: false, max_plies: 400, ..quick() };
        let games = generate_games(&FlipBoard::new(), &p);
        let s = summarize::<FlipBoard>(&games);
        assert_eq!(s.games, 3);
        assert_eq!(s.first_wins + s.second_wins + s.draws + s.unfinished, 3);
        assert_eq!(s.unfinished, 0, "random flip games end within 60 placements");
    }
}
