use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audit::AuditSummary;
use crate::config::EngineConfig;
use crate::model::{Competition, Fixture, StageProbabilityRow};
use crate::motivation::motivation;
use crate::reconcile::{ReconciledProgression, reconcile};
use crate::rotation::rotation_risk;
use crate::status::{QualificationStatus, classify};
use crate::value::{Recommendation, expected_points, opp_dead_factor, recommend, value_score};

/// Pass-1 result for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAssessment {
    pub row: StageProbabilityRow,
    pub progression: ReconciledProgression,
    pub status: QualificationStatus,
    pub motivation: f64,
    pub rotation_risk: f64,
}

/// One side of one fixture, ready for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScoreCard {
    pub team: String,
    pub opponent: String,
    /// Fraction in `[0, 1]`.
    pub win_pct: f64,
    pub ev: f64,
    pub motivation: f64,
    pub rotation_risk: f64,
    pub status: QualificationStatus,
    pub value: f64,
    pub opp_motivation: f64,
    pub opp_status: QualificationStatus,
    pub recommendation: Recommendation,
}

/// A fixture skipped because one or both team names did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedFixture {
    /// 0-based index into the accepted fixture list.
    pub fixture_index: usize,
    /// Line in the fixtures file.
    pub line: u64,
    pub home: String,
    pub away: String,
    /// Canonical keys absent from the standings table.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionReport {
    pub competition: Competition,
    pub teams: BTreeMap<String, TeamAssessment>,
    /// Sorted by value, best first.
    pub cards: Vec<MatchScoreCard>,
    pub unresolved: Vec<UnresolvedFixture>,
    pub audit: AuditSummary,
}

pub fn assess_team(row: &StageProbabilityRow, cfg: &EngineConfig) -> TeamAssessment {
    let progression = reconcile(row, &cfg.reconcile);
    let top24 = progression.top24_probability;
    let status = classify(row.current_position, top24, row.direct_qualify, &cfg.status);
    let motivation = motivation(row, top24, &cfg.motivation);
    let rotation_risk = rotation_risk(status, motivation, &cfg.rotation);
    TeamAssessment {
        row: row.clone(),
        progression,
        status,
        motivation,
        rotation_risk,
    }
}

/// Pass 1: every team of the competition, indexed by canonical key.
pub fn assess_teams(
    rows: &[StageProbabilityRow],
    cfg: &EngineConfig,
) -> BTreeMap<String, TeamAssessment> {
    rows.iter()
        .map(|row| {
            let a = assess_team(row, cfg);
            debug!(
                team = %row.team,
                top24 = a.progression.top24_probability,
                audit = %a.progression.audit_status,
                status = %a.status,
                motivation = a.motivation,
                risk = a.rotation_risk,
                "assessed team"
            );
            (row.key.clone(), a)
        })
        .collect()
}

pub fn score_side(
    own: &TeamAssessment,
    opp: &TeamAssessment,
    win: f64,
    draw: f64,
    cfg: &EngineConfig,
) -> MatchScoreCard {
    let ev = expected_points(win, draw);
    let opp_dead = opp_dead_factor(opp.status, opp.motivation, &cfg.value);
    let value = value_score(ev, own.motivation, own.rotation_risk, opp_dead, &cfg.value);
    MatchScoreCard {
        team: own.row.team.clone(),
        opponent: opp.row.team.clone(),
        win_pct: win,
        ev,
        motivation: own.motivation,
        rotation_risk: own.rotation_risk,
        status: own.status,
        value,
        opp_motivation: opp.motivation,
        opp_status: opp.status,
        recommendation: recommend(value, own.status, own.rotation_risk, &cfg.tiers),
    }
}

/// Runs both passes over one competition and ranks the resulting cards.
pub fn build_competition_report(
    competition: Competition,
    rows: &[StageProbabilityRow],
    fixtures: &[Fixture],
    cfg: &EngineConfig,
) -> CompetitionReport {
    let teams = assess_teams(rows, cfg);
    let audit = AuditSummary::from_assessments(teams.values());

    let mut cards = Vec::with_capacity(fixtures.len() * 2);
    let mut unresolved = Vec::new();

    for (fixture_index, fixture) in fixtures.iter().enumerate() {
        let home = teams.get(&fixture.home_key);
        let away = teams.get(&fixture.away_key);
        let (Some(home), Some(away)) = (home, away) else {
            let mut missing = Vec::new();
            if home.is_none() {
                missing.push(fixture.home_key.clone());
            }
            if away.is_none() {
                missing.push(fixture.away_key.clone());
            }
            warn!(
                competition = competition.prefix(),
                fixture = fixture_index,
                line = fixture.line,
                home = %fixture.home,
                away = %fixture.away,
                missing = ?missing,
                "skipping fixture with unknown team"
            );
            unresolved.push(UnresolvedFixture {
                fixture_index,
                line: fixture.line,
                home: fixture.home.clone(),
                away: fixture.away.clone(),
                missing,
            });
            continue;
        };

        cards.push(score_side(home, away, fixture.home_win, fixture.draw, cfg));
        cards.push(score_side(away, home, fixture.away_win, fixture.draw, cfg));
    }

    rank_cards(&mut cards);

    info!(
        competition = competition.prefix(),
        teams = teams.len(),
        cards = cards.len(),
        unresolved = unresolved.len(),
        anomalies = audit.sum_over_100.len(),
        stage_violations = audit.stage_violations.len(),
        "competition scored"
    );

    CompetitionReport {
        competition,
        teams,
        cards,
        unresolved,
        audit,
    }
}

/// Value descending; ties by team then opponent so output order is stable.
pub fn rank_cards(cards: &mut [MatchScoreCard]) {
    cards.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.team.cmp(&b.team))
            .then_with(|| a.opponent.cmp(&b.opponent))
    });
}
