// Shared minimax/alpha-beta core for two grid games
pub mod board;
pub mod config;
pub mod error;
pub mod rules;
pub mod search;
pub mod selfplay;
pub mod session;
pub mod worker;

pub use board::{CascadeBoard, FlipBoard, Player, Pos};
pub use error::{ConfigError, GameError};
pub use rules::{apply_move, legal_moves, terminal_winner, Game};
pub use worker::{choose_move, choose_move_async, SearchHandle};
