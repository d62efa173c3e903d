use std::path::PathBuf;

use crate::board::{Player, Pos};

/// Recoverable conditions raised by the game rules. None of them is fatal:
/// callers re-prompt, pick another candidate, pass the turn or carry on with
/// the board as it stands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid move {pos}: {reason}")]
    InvalidMove { pos: Pos, reason: &'static str },

    #[error("{player} has no legal move")]
    NoLegalMove { player: Player },

    #[error("cascade stopped after {generations} generations without settling")]
    CascadeOverflowGuardTripped { generations: usize },
}

/// Malformed coordinates or text board layouts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty coordinate")]
    EmptyCoordinate,

    #[error("bad column in '{0}'")]
    BadColumn(String),

    #[error("bad row in '{0}'")]
    BadRow(String),

    #[error("unsupported size {rows}x{cols}")]
    BadSize { rows: usize, cols: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    RowLength { row: usize, found: usize, expected: usize },

    #[error("bad cell '{0}'")]
    BadCell(String),

    #[error("count out of range in '{0}'")]
    CountOutOfRange(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
