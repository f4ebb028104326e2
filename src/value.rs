use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{TierConfig, ValueConfig};
use crate::status::QualificationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationTier {
    Caution,
    Neutral,
    Consider,
    StrongBuy,
}

impl RecommendationTier {
    pub fn label(self) -> &'static str {
        match self {
            RecommendationTier::Caution => "CAUTION",
            RecommendationTier::Neutral => "NEUTRAL",
            RecommendationTier::Consider => "CONSIDER",
            RecommendationTier::StrongBuy => "STRONG BUY",
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Situational warning shown next to the tier. Kept apart from the tier so
/// the tier stays a pure step function of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Advisory {
    /// The side itself is already eliminated.
    AvoidOut,
    /// High rotation risk: the starting XI may not be the usual one.
    Rotation,
}

impl Advisory {
    pub fn label(self) -> &'static str {
        match self {
            Advisory::AvoidOut => "AVOID (OUT)",
            Advisory::Rotation => "ROTATION",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tier: RecommendationTier,
    pub advisory: Option<Advisory>,
}

/// Expected league points from win/draw fractions.
pub fn expected_points(win: f64, draw: f64) -> f64 {
    3.0 * win + draw
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Multiplier in `[1, opp_dead_cap]` for facing an opponent with little at
/// stake: a fixed bonus per settled status plus a smooth bonus that switches
/// on as the opponent's motivation drops below the pivot.
pub fn opp_dead_factor(
    opp_status: QualificationStatus,
    opp_motivation: f64,
    cfg: &ValueConfig,
) -> f64 {
    let status_bonus = match opp_status {
        QualificationStatus::Out => cfg.opp_out_bonus,
        QualificationStatus::LockedDirectRo16 => cfg.opp_locked_direct_bonus,
        QualificationStatus::LockedPlayoffs => cfg.opp_locked_playoffs_bonus,
        QualificationStatus::InPlay => 0.0,
    };
    let op_m = opp_motivation / 100.0;
    let mot_bonus = cfg.opp_motivation_bonus
        * sigmoid((cfg.opp_motivation_pivot - op_m) / cfg.opp_motivation_temperature);
    let factor = 1.0 + status_bonus + mot_bonus;
    if factor.is_nan() {
        1.0
    } else {
        factor.clamp(1.0, cfg.opp_dead_cap)
    }
}

/// Ranking score in `[0, cfg.max]`.
///
/// `ev` is scaled to a 0–100 win-equivalent, tempered by own motivation,
/// lifted by `opp_dead_factor` and divided by rotation risk.
pub fn value_score(
    ev: f64,
    motivation: f64,
    rotation_risk: f64,
    opp_dead: f64,
    cfg: &ValueConfig,
) -> f64 {
    let m = (motivation / 100.0).clamp(0.0, 1.0);
    let risk = rotation_risk.max(f64::MIN_POSITIVE);
    let raw = 100.0 * (ev / 3.0) * (cfg.motivation_floor + cfg.motivation_weight * m) * opp_dead / risk;
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, cfg.max) }
}

pub fn tier_for(value: f64, cfg: &TierConfig) -> RecommendationTier {
    if value >= cfg.strong_buy {
        RecommendationTier::StrongBuy
    } else if value >= cfg.consider {
        RecommendationTier::Consider
    } else if value >= cfg.neutral {
        RecommendationTier::Neutral
    } else {
        RecommendationTier::Caution
    }
}

pub fn advisory_for(
    own_status: QualificationStatus,
    rotation_risk: f64,
    cfg: &TierConfig,
) -> Option<Advisory> {
    if own_status == QualificationStatus::Out {
        Some(Advisory::AvoidOut)
    } else if rotation_risk >= cfg.rotation_advisory {
        Some(Advisory::Rotation)
    } else {
        None
    }
}

pub fn recommend(
    value: f64,
    own_status: QualificationStatus,
    rotation_risk: f64,
    cfg: &TierConfig,
) -> Recommendation {
    Recommendation {
        tier: tier_for(value, cfg),
        advisory: advisory_for(own_status, rotation_risk, cfg),
    }
}
