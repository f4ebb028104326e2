use serde::{Deserialize, Serialize};

/// League-phase table size for both UEFA club competitions.
pub const LEAGUE_SIZE: u8 = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Competition {
    ChampionsLeague,
    EuropaLeague,
}

impl Competition {
    pub const ALL: [Competition; 2] = [Competition::ChampionsLeague, Competition::EuropaLeague];

    pub fn prefix(self) -> &'static str {
        match self {
            Competition::ChampionsLeague => "cl",
            Competition::EuropaLeague => "el",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Competition::ChampionsLeague => "CHAMPIONS LEAGUE",
            Competition::EuropaLeague => "EUROPA LEAGUE",
        }
    }

    pub fn data_dir_name(self) -> &'static str {
        match self {
            Competition::ChampionsLeague => "champions-league",
            Competition::EuropaLeague => "europa-league",
        }
    }

    pub fn table_file_name(self) -> String {
        format!("{}_table_predicted.csv", self.prefix())
    }

    pub fn fixtures_file_name(self) -> String {
        format!("{}_fixtures.csv", self.prefix())
    }

    pub fn report_file_name(self) -> String {
        format!("{}_recommendations.csv", self.prefix())
    }
}

/// One validated team row of the predicted league-phase table.
///
/// All stage values are percentages in `[0, 100]`. A correct row is
/// non-increasing by depth (`winner <= final <= semifinal <= quarterfinal`),
/// but that is audited by the reconciler rather than assumed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProbabilityRow {
    pub team: String,
    pub key: String,
    pub current_position: u8,
    pub expected_position: f64,
    pub expected_points: f64,
    pub league_first: f64,
    pub direct_qualify: f64,
    pub playoff_qualify: f64,
    pub quarterfinal: f64,
    pub semifinal: f64,
    pub final_stage: f64,
    pub winner: f64,
}

impl StageProbabilityRow {
    /// Zeroed row used as a base by callers that only care about a few stages.
    pub fn new(team: impl Into<String>, key: impl Into<String>, current_position: u8) -> Self {
        Self {
            team: team.into(),
            key: key.into(),
            current_position,
            expected_position: f64::from(current_position),
            expected_points: 0.0,
            league_first: 0.0,
            direct_qualify: 0.0,
            playoff_qualify: 0.0,
            quarterfinal: 0.0,
            semifinal: 0.0,
            final_stage: 0.0,
            winner: 0.0,
        }
    }
}

/// An upcoming league-phase fixture. Outcome probabilities are fractions
/// that sum to 1 (or are all zero when the source row carried no odds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub home: String,
    pub home_key: String,
    pub away: String,
    pub away_key: String,
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    /// 1-based line in the fixtures file, 0 for fixtures built in memory.
    #[serde(default)]
    pub line: u64,
}

impl Fixture {
    /// Builds a fixture from raw percentages, normalising them to fractions.
    pub fn from_percentages(
        home: (String, String),
        away: (String, String),
        home_win_pct: f64,
        draw_pct: f64,
        away_win_pct: f64,
    ) -> Self {
        let (home_win, draw, away_win) = normalize_outcomes(home_win_pct, draw_pct, away_win_pct);
        Self {
            home: home.0,
            home_key: home.1,
            away: away.0,
            away_key: away.1,
            home_win,
            draw,
            away_win,
            line: 0,
        }
    }
}

/// Scales H/D/A to fractions of their sum. A zero sum is treated as 1 so an
/// odds-less row stays at zero instead of becoming NaN.
pub fn normalize_outcomes(home: f64, draw: f64, away: f64) -> (f64, f64, f64) {
    let sum = home + draw + away;
    let sum = if sum == 0.0 || !sum.is_finite() { 1.0 } else { sum };
    let frac = |v: f64| {
        let out = v / sum;
        if out.is_finite() { out } else { 0.0 }
    };
    (frac(home), frac(draw), frac(away))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_normalise_to_one() {
        let (h, d, a) = normalize_outcomes(50.0, 30.0, 30.0);
        assert!((h + d + a - 1.0).abs() < 1e-12);
        assert!((h - 50.0 / 110.0).abs() < 1e-12);
    }

    #[test]
    fn zero_outcomes_stay_zero() {
        assert_eq!(normalize_outcomes(0.0, 0.0, 0.0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn file_names_follow_prefix() {
        assert_eq!(
            Competition::EuropaLeague.table_file_name(),
            "el_table_predicted.csv"
        );
        assert_eq!(
            Competition::ChampionsLeague.report_file_name(),
            "cl_recommendations.csv"
        );
    }
}
