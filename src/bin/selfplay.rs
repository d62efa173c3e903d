use clap::Parser;
use gridwar::board::Player;
use gridwar::config::{EngineConfig, GameKind};
use gridwar::rules::Game;
use gridwar::selfplay::{generate_games, summarize, write_records, SelfPlayParams};
use gridwar::FlipBoard;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridwar-selfplay", about = "Play engine games in batch and report a summary")]
struct Args {
    #[arg(long, value_enum, default_value_t = GameKind::Cascade)]
    game: GameKind,
    #[arg(long, default_value_t = 20)]
    games: usize,
    #[arg(long, default_value_t = 200)]
    max_plies: usize,
    #[arg(long, default_value_t = 1)]
    threads: usize,
    #[arg(long, default_value_t = 2)]
    depth: u32,
    #[arg(long)]
    movetime_ms: Option<u64>,
    #[arg(long, default_value_t = 50_000)]
    max_nodes: u64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Plain random play for both sides
    #[arg(long)]
    random: bool,
    /// Let one side ('first' or 'second') play randomly against the engine
    #[arg(long)]
    random_side: Option<String>,
    #[arg(long, default_value_t = 2)]
    opening_plies: usize,
    #[arg(long, default_value_t = 4)]
    opening_topk: usize,
    /// Board size and generation cap for cascade games
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write every game as JSON lines into this directory
    #[arg(long)]
    out: Option<PathBuf>,
}

fn run<G: Game + Sync>(start: &G, params: &SelfPlayParams, out: Option<&PathBuf>) -> anyhow::Result<()> {
    let games = generate_games(start, params);
    if let Some(dir) = out {
        let path = write_records(&games, dir)?;
        eprintln!("Wrote {} games to {}", games.len(), path.display());
    }
    println!("{}", serde_json::to_string_pretty(&summarize::<G>(&games))?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let a = Args::parse();
    let random_side = match a.random_side.as_deref() {
        None => None,
        Some("first") => Some(Player::First),
        Some("second") => Some(Player::Second),
        Some(other) => anyhow::bail!("Invalid side '{other}': use 'first' or 'second'"),
    };
    let params = SelfPlayParams {
        games: a.games,
        max_plies: a.max_plies,
        threads: a.threads,
        use_engine: !a.random,
        random_side,
        depth: a.depth,
        movetime_ms: a.movetime_ms,
        max_nodes: Some(a.max_nodes),
        seed: a.seed,
        opening_plies: a.opening_plies,
        opening_topk: a.opening_topk,
    };
    eprintln!("Generating {} {:?} games (depth={}, threads={}, engine={})", a.games, a.game, a.depth, a.threads, !a.random);
    match a.game {
        GameKind::Cascade => {
            let config = match &a.config {
                Some(p) => EngineConfig::load(p)?,
                None => EngineConfig::default(),
            };
            run(&config.cascade_board(), &params, a.out.as_ref())
        }
        GameKind::Flip => run(&FlipBoard::new(), &params, a.out.as_ref()),
    }
}
