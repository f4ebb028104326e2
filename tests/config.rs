use std::fs;
use std::path::PathBuf;

use cup_picks::config::{ConfigError, EngineConfig};
use cup_picks::model::Competition;
use cup_picks::pipeline::run_competition;
use cup_picks::value::RecommendationTier;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data")
}

#[test]
fn partial_file_overrides_only_named_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cup_picks.toml");
    fs::write(
        &path,
        r#"
[tiers]
strong_buy = 1000.0
consider = 999.0
neutral = 998.0

[ingest]
expected_fixtures = 17
"#,
    )
    .unwrap();

    let cfg = EngineConfig::load(&path).unwrap();
    assert_eq!(cfg.tiers.strong_buy, 1000.0);
    assert_eq!(cfg.ingest.expected_fixtures, Some(17));
    assert_eq!(cfg.status, EngineConfig::default().status);
    assert_eq!(cfg.aliases, EngineConfig::default().aliases);

    let run = run_competition(&data_dir(), Competition::ChampionsLeague, &cfg).unwrap();
    assert!(
        run.report
            .cards
            .iter()
            .all(|c| c.recommendation.tier == RecommendationTier::Caution)
    );
}

#[test]
fn alias_table_replaces_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cup_picks.toml");
    fs::write(&path, "[aliases]\n\"spurs\" = \"tottenham\"\n").unwrap();

    let cfg = EngineConfig::load(&path).unwrap();
    assert_eq!(cfg.aliases.resolve("spurs"), "tottenham");
    assert_eq!(cfg.aliases.resolve("real"), "real");

    // Without the default aliases "Real" and "Atletico Madrid" no longer resolve.
    let run = run_competition(&data_dir(), Competition::ChampionsLeague, &cfg).unwrap();
    assert_eq!(run.report.unresolved.len(), 2);
}

#[test]
fn invalid_values_are_rejected_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[status]\ntop8_cutoff = 30\n").unwrap();
    assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Invalid(_))));

    fs::write(&path, "[status\n").unwrap();
    match EngineConfig::load(&path) {
        Err(ConfigError::Parse { path: p, .. }) => assert!(p.ends_with("bad.toml")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn shipped_sample_matches_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("cup_picks.sample.toml");
    assert_eq!(EngineConfig::load(&path).unwrap(), EngineConfig::default());
}

#[test]
fn heavy_weights_cannot_push_value_past_ceiling() {
    let cfg = EngineConfig::from_toml_str("[value]\nmotivation_floor = 5.0\n").unwrap();
    let run = run_competition(&data_dir(), Competition::ChampionsLeague, &cfg).unwrap();
    assert!(run.report.cards.iter().all(|c| (0.0..=140.0).contains(&c.value)));
    assert!(run.report.cards.iter().any(|c| c.value == 140.0));

    assert!(EngineConfig::from_toml_str("[value]\nmax = 1000.0\nmotivation_floor = 5.0\n").is_err());
}

#[test]
fn nan_in_config_file_is_rejected_before_scoring() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nan.toml");
    fs::write(&path, "[value]\nopp_dead_cap = nan\n").unwrap();
    assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Invalid(_))));
}
