use log::warn;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

use crate::board::cascade::DEFAULT_GENERATION_CAP;
use crate::board::{CascadeBoard, FlipBoard, MAX_SIDE};
use crate::error::ConfigError;
use crate::rules::{BranchLimit, DepthPolicy, Game};
use crate::search::{Branching, SearchParams};

/// Which game a front end is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Cascade,
    Flip,
}

/// Search budget and shape for one game. Fields left out of a TOML section
/// keep that game's defaults.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SearchConfig {
    pub time_budget_ms: u64,
    /// 0 lets the depth policy decide.
    pub max_depth: u32,
    pub max_nodes: Option<u64>,
    pub use_tt: bool,
    pub tt_entries: usize,
    pub iterative: bool,
    pub depth_policy: DepthPolicy,
    /// `None` searches every legal move. A threshold above the number of
    /// legal moves never caps.
    pub branch_limit: Option<BranchLimit>,
}

/// A `[cascade]` or `[flip]` section as written: any subset of fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SearchSection {
    time_budget_ms: Option<u64>,
    max_depth: Option<u32>,
    max_nodes: Option<u64>,
    use_tt: Option<bool>,
    tt_entries: Option<usize>,
    iterative: Option<bool>,
    depth_policy: Option<DepthPolicy>,
    branch_limit: Option<BranchLimit>,
}

impl SearchSection {
    fn over(self, mut base: SearchConfig) -> SearchConfig {
        if let Some(v) = self.time_budget_ms { base.time_budget_ms = v; }
        if let Some(v) = self.max_depth { base.max_depth = v; }
        if self.max_nodes.is_some() { base.max_nodes = self.max_nodes; }
        if let Some(v) = self.use_tt { base.use_tt = v; }
        if let Some(v) = self.tt_entries { base.tt_entries = v; }
        if let Some(v) = self.iterative { base.iterative = v; }
        if let Some(v) = self.depth_policy { base.depth_policy = v; }
        if self.branch_limit.is_some() { base.branch_limit = self.branch_limit; }
        base
    }
}

fn cascade_section<'de, D: Deserializer<'de>>(d: D) -> Result<SearchConfig, D::Error> {
    Ok(SearchSection::deserialize(d)?.over(SearchConfig::cascade()))
}

fn flip_section<'de, D: Deserializer<'de>>(d: D) -> Result<SearchConfig, D::Error> {
    Ok(SearchSection::deserialize(d)?.over(SearchConfig::flip()))
}

impl SearchConfig {
    fn for_game<G: Game>(board: &G, time_budget_ms: u64, iterative: bool) -> Self {
        Self {
            time_budget_ms,
            max_depth: 0,
            max_nodes: None,
            use_tt: true,
            tt_entries: 1 << 16,
            iterative,
            depth_policy: G::default_depth_policy(),
            branch_limit: board.default_branch_limit(),
        }
    }

    /// Cascade: fixed depth per phase within 1.2 s.
    pub fn cascade() -> Self { Self::for_game(&CascadeBoard::new(), 1200, false) }

    /// Flip: iterative deepening within 0.8 s.
    pub fn flip() -> Self { Self::for_game(&FlipBoard::new(), 800, true) }

    pub fn to_params(&self) -> SearchParams {
        SearchParams {
            depth: self.max_depth,
            depth_policy: Some(self.depth_policy),
            max_nodes: self.max_nodes,
            movetime: Some(Duration::from_millis(self.time_budget_ms)),
            use_tt: self.use_tt,
            tt_entries: self.tt_entries,
            iterative: self.iterative,
            exhaustive: false,
            branching: self.branch_limit.map_or(Branching::Unlimited, Branching::Limit),
        }
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        let p = &self.depth_policy;
        if p.opening == 0 || p.middle == 0 || p.late == 0 {
            return Err(ConfigError::Validation(format!("{section}.depth_policy depths must be > 0")));
        }
        if self.max_nodes == Some(0) {
            return Err(ConfigError::Validation(format!("{section}.max_nodes must be > 0")));
        }
        if let Some(l) = self.branch_limit {
            if l.cap == 0 { return Err(ConfigError::Validation(format!("{section}.branch_limit.cap must be > 0"))); }
        }
        if self.use_tt && self.tt_entries == 0 {
            return Err(ConfigError::Validation(format!("{section}.tt_entries must be > 0")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CascadeBoardConfig {
    pub rows: u8,
    pub cols: u8,
    pub generation_cap: usize,
}

impl Default for CascadeBoardConfig {
    fn default() -> Self {
        Self { rows: CascadeBoard::ROWS, cols: CascadeBoard::COLS, generation_cap: DEFAULT_GENERATION_CAP }
    }
}

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cascade_board: CascadeBoardConfig,
    #[serde(deserialize_with = "cascade_section")]
    pub cascade: SearchConfig,
    #[serde(deserialize_with = "flip_section")]
    pub flip: SearchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cascade_board: CascadeBoardConfig::default(),
            cascade: SearchConfig::cascade(),
            flip: SearchConfig::flip(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.cascade_board;
        let side = 2..=MAX_SIDE;
        if !side.contains(&b.rows) || !side.contains(&b.cols) {
            return Err(ConfigError::Validation(format!("cascade_board rows and cols must be in 2..={MAX_SIDE}")));
        }
        if b.generation_cap == 0 {
            return Err(ConfigError::Validation("cascade_board.generation_cap must be > 0".into()));
        }
        self.cascade.validate("cascade")?;
        self.flip.validate("flip")?;
        Ok(())
    }

    pub fn search(&self, kind: GameKind) -> &SearchConfig {
        match kind {
            GameKind::Cascade => &self.cascade,
            GameKind::Flip => &self.flip,
        }
    }

    pub fn search_mut(&mut self, kind: GameKind) -> &mut SearchConfig {
        match kind {
            GameKind::Cascade => &mut self.cascade,
            GameKind::Flip => &mut self.flip,
        }
    }

    pub fn cascade_board(&self) -> CascadeBoard {
        let b = &self.cascade_board;
        CascadeBoard::with_size(b.rows, b.cols).with_generation_cap(b.generation_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let c = EngineConfig::default();
        c.validate().unwrap();
        assert!(c.flip.iterative);
        assert!(!c.cascade.iterative);
        assert_eq!(c.cascade.branch_limit, Some(BranchLimit { threshold: 8, cap: 6 }));
        assert_eq!(c.flip.branch_limit, None);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c = EngineConfig::from_toml("[cascade_board]\nrows = 6\n").unwrap();
        assert_eq!(c.cascade_board.rows, 6);
        assert_eq!(c.cascade_board.cols, 5);
        assert_eq!(c.flip, EngineConfig::default().flip);
        assert_eq!(c.cascade_board().dims(), (6, 5));
    }

    #[test]
    fn partial_search_section_keeps_game_defaults() {
        let c = EngineConfig::from_toml("[flip]\ntime_budget_ms = 250\n\n[cascade]\nmax_depth = 4\n").unwrap();
        assert_eq!(c.flip, SearchConfig { time_budget_ms: 250, ..SearchConfig::flip() });
        assert_eq!(c.cascade, SearchConfig { max_depth: 4, ..SearchConfig::cascade() });
        assert_eq!(c.cascade.branch_limit, Some(BranchLimit { threshold: 8, cap: 6 }));
    }

    #[test]
    fn unknown_search_field_is_a_parse_error() {
        let err = EngineConfig::from_toml("[flip]\nmax_dpeth = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn zero_depth_policy_is_rejected() {
        let mut c = EngineConfig::default();
        c.flip.depth_policy.middle = 0;
        assert!(matches!(c.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn params_follow_config() {
        let c = EngineConfig::default();
        let p = c.search(GameKind::Cascade).to_params();
        assert_eq!(p.movetime, Some(Duration::from_millis(1200)));
        assert_eq!(p.branching, Branching::Limit(BranchLimit { threshold: 8, cap: 6 }));
        let f = c.search(GameKind::Flip).to_params();
        assert_eq!(f.branching, Branching::Unlimited);
        assert!(f.iterative && f.use_tt);
    }

    #[test]
    fn missing_file_falls_back() {
        let c = EngineConfig::load_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(c, EngineConfig::default());
    }
}
