use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::LEAGUE_SIZE;

/// Upper bound of the value index; a config may lower it but never raise it.
pub const VALUE_CEILING: f64 = 140.0;
/// Fixed range of the rotation-risk index.
pub const RISK_FLOOR: f64 = 1.0;
pub const RISK_CEILING: f64 = 2.3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every tunable of the engine. Missing sections or fields fall back to the
/// calibrated defaults, so an operator file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub status: StatusConfig,
    pub reconcile: ReconcileConfig,
    pub motivation: MotivationConfig,
    pub rotation: RotationConfig,
    pub value: ValueConfig,
    pub tiers: TierConfig,
    pub ingest: IngestConfig,
    pub aliases: AliasMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub top8_cutoff: u8,
    pub top24_cutoff: u8,
    // Percentages.
    pub out_ceiling: f64,
    pub lock_floor: f64,
    pub playoff_direct_ceiling: f64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            top8_cutoff: 8,
            top24_cutoff: 24,
            out_ceiling: 1.5,
            lock_floor: 98.5,
            playoff_direct_ceiling: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub sum_tolerance: f64,
    pub stage_tolerance: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            sum_tolerance: 1e-4,
            stage_tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotivationConfig {
    pub base: f64,
    pub beta: f64,
    pub survival_weight: f64,
    pub top8_weight: f64,
    pub seed_weight: f64,
    pub seed_center: f64,
    pub seed_width: f64,
    pub seed_min_pos: f64,
    pub seed_max_pos: f64,
    pub seed_playoff_floor: f64,
}

impl Default for MotivationConfig {
    fn default() -> Self {
        Self {
            base: 12.0,
            beta: 0.35,
            survival_weight: 65.0,
            top8_weight: 45.0,
            seed_weight: 22.0,
            seed_center: 12.5,
            seed_width: 4.0,
            seed_min_pos: 7.0,
            seed_max_pos: 18.0,
            seed_playoff_floor: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub out_bump: f64,
    pub locked_direct_bump: f64,
    pub locked_playoffs_bump: f64,
    pub slope_base: f64,
    pub slope: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            out_bump: 0.95,
            locked_direct_bump: 0.65,
            locked_playoffs_bump: 0.38,
            slope_base: 1.15,
            slope: 0.35,
            min: 1.0,
            max: 2.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    pub opp_out_bonus: f64,
    pub opp_locked_direct_bonus: f64,
    pub opp_locked_playoffs_bonus: f64,
    pub opp_motivation_bonus: f64,
    pub opp_motivation_pivot: f64,
    pub opp_motivation_temperature: f64,
    pub opp_dead_cap: f64,
    pub motivation_floor: f64,
    pub motivation_weight: f64,
    pub max: f64,
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            opp_out_bonus: 0.22,
            opp_locked_direct_bonus: 0.12,
            opp_locked_playoffs_bonus: 0.15,
            opp_motivation_bonus: 0.18,
            opp_motivation_pivot: 0.45,
            opp_motivation_temperature: 0.08,
            opp_dead_cap: 1.35,
            motivation_floor: 0.55,
            motivation_weight: 0.45,
            max: 140.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub strong_buy: f64,
    pub consider: f64,
    pub neutral: f64,
    pub rotation_advisory: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            strong_buy: 70.0,
            consider: 50.0,
            neutral: 30.0,
            rotation_advisory: 1.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub expected_teams: Option<usize>,
    pub expected_fixtures: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            expected_teams: Some(usize::from(LEAGUE_SIZE)),
            expected_fixtures: Some(usize::from(LEAGUE_SIZE) / 2),
        }
    }
}

/// Raw (already diacritic-folded, lowercased) name → canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap(pub BTreeMap<String, String>);

impl Default for AliasMap {
    fn default() -> Self {
        let pairs = [
            ("boda/glimt", "bodo/glimt"),
            ("kabenhavn", "kobenhavn"),
            ("atletico madrid", "atletico"),
            ("atletico de madrid", "atletico"),
            ("real", "real madrid"),
            ("nottm forest", "nottingham forest"),
        ];
        Self(
            pairs
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
        )
    }
}

impl AliasMap {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.0.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_toml_str(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, v) in self.float_fields() {
            if !v.is_finite() {
                return Err(ConfigError::Invalid(format!("{name}={v} must be a finite number")));
            }
        }

        let s = &self.status;
        for (name, cutoff) in [("top8_cutoff", s.top8_cutoff), ("top24_cutoff", s.top24_cutoff)] {
            if cutoff == 0 || cutoff > LEAGUE_SIZE {
                return Err(ConfigError::Invalid(format!(
                    "{name}={cutoff} must be within 1..={LEAGUE_SIZE}"
                )));
            }
        }
        if s.top8_cutoff >= s.top24_cutoff {
            return Err(ConfigError::Invalid(format!(
                "top8_cutoff ({}) must be below top24_cutoff ({})",
                s.top8_cutoff, s.top24_cutoff
            )));
        }
        for (name, v) in [
            ("out_ceiling", s.out_ceiling),
            ("lock_floor", s.lock_floor),
            ("playoff_direct_ceiling", s.playoff_direct_ceiling),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return Err(ConfigError::Invalid(format!(
                    "status.{name}={v} must be a percentage"
                )));
            }
        }
        if s.out_ceiling >= s.lock_floor {
            return Err(ConfigError::Invalid(
                "out_ceiling must be below lock_floor".to_string(),
            ));
        }

        let t = &self.tiers;
        if !(t.neutral < t.consider && t.consider < t.strong_buy) {
            return Err(ConfigError::Invalid(
                "tier thresholds must be strictly ascending (neutral < consider < strong_buy)"
                    .to_string(),
            ));
        }

        let r = &self.rotation;
        if !(RISK_FLOOR <= r.min && r.min <= r.max && r.max <= RISK_CEILING) {
            return Err(ConfigError::Invalid(format!(
                "rotation bounds must satisfy {RISK_FLOOR} <= min ({}) <= max ({}) <= {RISK_CEILING}",
                r.min, r.max
            )));
        }

        if self.motivation.seed_width <= 0.0 || self.value.opp_motivation_temperature <= 0.0 {
            return Err(ConfigError::Invalid(
                "seed_width and opp_motivation_temperature must be positive".to_string(),
            ));
        }
        let v = &self.value;
        if !(v.max > 0.0 && v.max <= VALUE_CEILING) {
            return Err(ConfigError::Invalid(format!(
                "value.max={} must be within (0, {VALUE_CEILING}]",
                v.max
            )));
        }
        if v.opp_dead_cap < 1.0 {
            return Err(ConfigError::Invalid(
                "opp_dead_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn float_fields(&self) -> Vec<(&'static str, f64)> {
        let (s, r, m, rot, v, t) = (
            &self.status,
            &self.reconcile,
            &self.motivation,
            &self.rotation,
            &self.value,
            &self.tiers,
        );
        vec![
            ("status.out_ceiling", s.out_ceiling),
            ("status.lock_floor", s.lock_floor),
            ("status.playoff_direct_ceiling", s.playoff_direct_ceiling),
            ("reconcile.sum_tolerance", r.sum_tolerance),
            ("reconcile.stage_tolerance", r.stage_tolerance),
            ("motivation.base", m.base),
            ("motivation.beta", m.beta),
            ("motivation.survival_weight", m.survival_weight),
            ("motivation.top8_weight", m.top8_weight),
            ("motivation.seed_weight", m.seed_weight),
            ("motivation.seed_center", m.seed_center),
            ("motivation.seed_width", m.seed_width),
            ("motivation.seed_min_pos", m.seed_min_pos),
            ("motivation.seed_max_pos", m.seed_max_pos),
            ("motivation.seed_playoff_floor", m.seed_playoff_floor),
            ("rotation.out_bump", rot.out_bump),
            ("rotation.locked_direct_bump", rot.locked_direct_bump),
            ("rotation.locked_playoffs_bump", rot.locked_playoffs_bump),
            ("rotation.slope_base", rot.slope_base),
            ("rotation.slope", rot.slope),
            ("rotation.min", rot.min),
            ("rotation.max", rot.max),
            ("value.opp_out_bonus", v.opp_out_bonus),
            ("value.opp_locked_direct_bonus", v.opp_locked_direct_bonus),
            ("value.opp_locked_playoffs_bonus", v.opp_locked_playoffs_bonus),
            ("value.opp_motivation_bonus", v.opp_motivation_bonus),
            ("value.opp_motivation_pivot", v.opp_motivation_pivot),
            ("value.opp_motivation_temperature", v.opp_motivation_temperature),
            ("value.opp_dead_cap", v.opp_dead_cap),
            ("value.motivation_floor", v.motivation_floor),
            ("value.motivation_weight", v.motivation_weight),
            ("value.max", v.max),
            ("tiers.strong_buy", t.strong_buy),
            ("tiers.consider", t.consider),
            ("tiers.neutral", t.neutral),
            ("tiers.rotation_advisory", t.rotation_advisory),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            [status]
            top8_cutoff = 6

            [aliases]
            "man city" = "manchester city"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.status.top8_cutoff, 6);
        assert_eq!(cfg.status.top24_cutoff, 24);
        assert_eq!(cfg.value, ValueConfig::default());
        assert_eq!(cfg.aliases.resolve("man city"), "manchester city");
        // An explicit alias table replaces the built-in one.
        assert_eq!(cfg.aliases.resolve("real"), "real");
    }

    #[test]
    fn rejects_inverted_cutoffs() {
        let err = EngineConfig::from_toml_str("[status]\ntop8_cutoff = 24\ntop24_cutoff = 8\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_cutoff_outside_league() {
        let err = EngineConfig::from_toml_str("[status]\ntop24_cutoff = 40\n").unwrap_err();
        assert!(err.to_string().contains("top24_cutoff"));
    }

    #[test]
    fn rejects_nan_values() {
        for raw in [
            "[value]\nopp_dead_cap = nan\n",
            "[value]\nmax = nan\n",
            "[rotation]\nmin = nan\n",
            "[rotation]\nmax = nan\n",
            "[status]\nplayoff_direct_ceiling = nan\n",
            "[motivation]\nbeta = inf\n",
        ] {
            let err = EngineConfig::from_toml_str(raw).unwrap_err();
            assert!(err.to_string().contains("finite"), "{raw}: {err}");
        }
    }

    #[test]
    fn value_max_cannot_exceed_ceiling() {
        let err = EngineConfig::from_toml_str("[value]\nmax = 1000.0\n").unwrap_err();
        assert!(err.to_string().contains("value.max"));
        let cfg = EngineConfig::from_toml_str("[value]\nmax = 100.0\n").unwrap();
        assert_eq!(cfg.value.max, 100.0);
    }

    #[test]
    fn rotation_bounds_stay_inside_fixed_range() {
        for raw in [
            "[rotation]\nmin = 0.5\n",
            "[rotation]\nmax = 3.0\n",
            "[rotation]\nmin = 2.0\nmax = 1.5\n",
        ] {
            let err = EngineConfig::from_toml_str(raw).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{raw}");
        }
        let cfg = EngineConfig::from_toml_str("[rotation]\nmin = 1.1\nmax = 2.0\n").unwrap();
        assert_eq!((cfg.rotation.min, cfg.rotation.max), (1.1, 2.0));
    }

    #[test]
    fn rejects_unordered_tiers() {
        let err = EngineConfig::from_toml_str("[tiers]\nconsider = 80.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
