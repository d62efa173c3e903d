use gridwar::config::{EngineConfig, GameKind};
use gridwar::rules::BranchLimit;
use gridwar::search::Branching;
use gridwar::ConfigError;
use std::fs::{create_dir_all, write};
use std::path::Path;
use std::time::Duration;

fn write_config(name: &str, body: &str) -> std::path::PathBuf {
    let dir = Path::new("target/config_test");
    create_dir_all(dir).unwrap();
    let path = dir.join(name);
    write(&path, body).unwrap();
    path
}

#[test]
fn load_overrides_selected_fields() {
    let path = write_config("custom.toml", r#"
[cascade_board]
rows = 6
cols = 7
generation_cap = 300

[flip]
time_budget_ms = 250
max_depth = 5
max_nodes = 10000
use_tt = false
tt_entries = 1024
iterative = true
depth_policy = { opening = 1, middle = 2, late = 3 }
branch_limit = { threshold = 10, cap = 4 }
"#);
    let c = EngineConfig::load(&path).unwrap();
    assert_eq!(c.cascade_board().dims(), (6, 7));
    assert_eq!(c.cascade_board().generation_cap(), 300);
    let p = c.search(GameKind::Flip).to_params();
    assert_eq!(p.depth, 5);
    assert_eq!(p.movetime, Some(Duration::from_millis(250)));
    assert_eq!(p.max_nodes, Some(10_000));
    assert!(!p.use_tt);
    assert_eq!(p.branching, Branching::Limit(BranchLimit { threshold: 10, cap: 4 }));
    assert_eq!(c.cascade, EngineConfig::default().cascade);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let path = write_config("broken.toml", "[cascade_board\nrows = ");
    assert!(matches!(EngineConfig::load(&path), Err(ConfigError::TomlParse(_))));
}

#[test]
fn out_of_range_board_is_rejected() {
    let path = write_config("huge.toml", "[cascade_board]\nrows = 40\n");
    assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Validation(_))));
}

#[test]
fn unreadable_path_reports_file_error() {
    let err = EngineConfig::load(Path::new("target/config_test/missing/none.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileRead { .. }));
    assert!(err.to_string().contains("none.toml"));
}
