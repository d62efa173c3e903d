pub mod alphabeta;
pub mod eval;
pub mod noise;
pub mod tt;
pub mod zobrist;

pub use alphabeta::{Branching, Node, SearchParams, SearchResult, Searcher, INF};
