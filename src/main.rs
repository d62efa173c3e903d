use anyhow::Result;
use clap::Parser;
use gridwar::board::{Player, Pos};
use gridwar::config::{EngineConfig, GameKind};
use gridwar::rules::{Cascade, Game};
use gridwar::search::SearchParams;
use gridwar::session::{EngineStatus, Session};
use gridwar::FlipBoard;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play cascade or flip against the search engine", long_about = None)]
struct Args {
    /// Which game to play
    #[arg(long, value_enum, default_value_t = GameKind::Cascade)]
    game: GameKind,

    /// Operation mode: 'h' for human vs engine, 's' for engine vs engine
    #[arg(long, default_value = "h")]
    mode: String,

    /// Your side: 'first' or 'second'
    #[arg(long, default_value = "first")]
    human: String,

    /// TOML engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine time budget per move in milliseconds (overrides config)
    #[arg(long)]
    time_ms: Option<u64>,

    /// Maximum search depth, 0 for the phase policy (overrides config)
    #[arg(long)]
    depth: Option<u32>,

    /// Stop engine-vs-engine games after this many plies
    #[arg(long, default_value_t = 400)]
    max_plies: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print every engine decision as JSON
    #[arg(long)]
    json: bool,
}

fn parse_side(s: &str) -> Result<Player> {
    match s.to_lowercase().as_str() {
        "f" | "first" | "1" => Ok(Player::First),
        "s" | "second" | "2" => Ok(Player::Second),
        _ => anyhow::bail!("Invalid side: use 'first' or 'second'"),
    }
}

/// One-line account of what a move did to the board.
trait Narrate {
    fn narrate(&self) -> Option<String>;
}

impl Narrate for Cascade {
    fn narrate(&self) -> Option<String> {
        if let Some(e) = self.guard_tripped() {
            return Some(format!("warning: {e}"));
        }
        if self.is_empty() { None } else { Some(format!("chain reaction: {} generations, {} cells burst", self.len(), self.discharges())) }
    }
}

impl Narrate for Vec<Pos> {
    fn narrate(&self) -> Option<String> {
        Some(format!("{} stone(s) flipped", self.len()))
    }
}

fn read_human_move<G: Game>(session: &Session<G>) -> Result<Option<Pos>> {
    loop {
        print!("{} to move (e.g. c3, or 'quit'): ", session.to_move());
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 { return Ok(None); }
        let input = input.trim();
        if input.eq_ignore_ascii_case("quit") { return Ok(None); }
        match input.parse::<Pos>() {
            Ok(p) => return Ok(Some(p)),
            Err(e) => println!("{e}"),
        }
    }
}

fn run<G: Game>(board: G, params: SearchParams, args: &Args, human: Option<Player>) -> Result<()>
where
    G::Effect: Narrate,
{
    let mut session = Session::new(board).with_seed(args.seed);
    // Give the engine its budget plus slack before the wait forces a cancel.
    let wait = params.movetime.map_or(Duration::from_secs(60), |t| t + Duration::from_secs(2));
    println!("{}", session.board());
    loop {
        if session.is_over() {
            match session.winner() {
                Some(p) => println!("\nGame over: {p} wins"),
                None => println!("\nGame over: draw"),
            }
            break;
        }
        if session.history().len() >= args.max_plies {
            println!("\nStopping after {} plies", args.max_plies);
            break;
        }
        if let Some(e) = session.pass_if_stuck() {
            println!("{e}; turn passes");
            continue;
        }

        if human == Some(session.to_move()) {
            let Some(pos) = read_human_move(&session)? else { break };
            match session.play(pos) {
                Ok(effect) => {
                    if let Some(s) = effect.narrate() { println!("{s}"); }
                    println!("{}", session.board());
                }
                Err(e) => println!("{e}"),
            }
            continue;
        }

        session.start_engine(params);
        match session.wait_engine(wait) {
            EngineStatus::Played { mv, effect, decision } => {
                println!(
                    "{} plays {mv} (depth {}, score {}, {} nodes, {} ms{})",
                    decision.player,
                    decision.search.depth,
                    decision.search.score,
                    decision.search.nodes,
                    decision.search.elapsed_ms,
                    if decision.fallback { ", random fallback" } else { "" }
                );
                if args.json { println!("{}", serde_json::to_string(&decision)?); }
                if let Some(s) = effect.narrate() { println!("{s}"); }
                println!("{}", session.board());
            }
            EngineStatus::Passed { player } => println!("{player} has no move; turn passes"),
            EngineStatus::Discarded => anyhow::bail!("engine proposed a move the board rejected"),
            EngineStatus::Idle | EngineStatus::Thinking => anyhow::bail!("engine produced no decision"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mode = args.mode.chars().next().unwrap_or('h');
    let human = match mode {
        'h' => Some(parse_side(&args.human)?),
        's' => None,
        _ => anyhow::bail!("Invalid mode: use 'h' or 's'"),
    };

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let search = config.search_mut(args.game);
    if let Some(t) = args.time_ms { search.time_budget_ms = t; }
    if let Some(d) = args.depth { search.max_depth = d; }
    config.validate()?;
    let params = config.search(args.game).to_params();

    match args.game {
        GameKind::Cascade => run(config.cascade_board(), params, &args, human),
        GameKind::Flip => run(FlipBoard::new(), params, &args, human),
    }
}
