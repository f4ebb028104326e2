use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::StatusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualificationStatus {
    /// No realistic path back inside the top-24 cutoff.
    Out,
    /// Certain to finish inside the direct round-of-16 places.
    #[serde(rename = "LOCKED_DIRECT_RO16")]
    LockedDirectRo16,
    /// Certain to finish in the play-off band, with no live top-8 chance.
    LockedPlayoffs,
    /// Probability mass still spans the 8/9 or 24/25 boundary.
    InPlay,
}

impl QualificationStatus {
    pub const ALL: [QualificationStatus; 4] = [
        QualificationStatus::Out,
        QualificationStatus::LockedDirectRo16,
        QualificationStatus::LockedPlayoffs,
        QualificationStatus::InPlay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QualificationStatus::Out => "OUT",
            QualificationStatus::LockedDirectRo16 => "LOCKED_DIRECT_RO16",
            QualificationStatus::LockedPlayoffs => "LOCKED_PLAYOFFS",
            QualificationStatus::InPlay => "IN_PLAY",
        }
    }

    pub fn is_locked(self) -> bool {
        matches!(
            self,
            QualificationStatus::LockedDirectRo16 | QualificationStatus::LockedPlayoffs
        )
    }
}

impl fmt::Display for QualificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a team's standing and reconciled chances to its qualification state.
///
/// `top24_probability` and `direct_qualify` are percentages. "Locked" and
/// "out" are approximated with the configured near-certainty thresholds.
pub fn classify(
    current_position: u8,
    top24_probability: f64,
    direct_qualify: f64,
    cfg: &StatusConfig,
) -> QualificationStatus {
    if direct_qualify >= cfg.lock_floor && current_position <= cfg.top8_cutoff {
        return QualificationStatus::LockedDirectRo16;
    }
    if top24_probability >= cfg.lock_floor && direct_qualify <= cfg.playoff_direct_ceiling {
        return QualificationStatus::LockedPlayoffs;
    }
    if top24_probability <= cfg.out_ceiling && current_position > cfg.top24_cutoff {
        return QualificationStatus::Out;
    }
    QualificationStatus::InPlay
}
