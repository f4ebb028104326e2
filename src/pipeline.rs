use std::path::Path;

use rayon::prelude::*;
use tracing::info;

use crate::config::EngineConfig;
use crate::ingest::{self, IngestError, RejectedRow};
use crate::model::Competition;
use crate::report::{CompetitionReport, build_competition_report};

pub struct CompetitionRun {
    pub report: CompetitionReport,
    pub rejected_teams: Vec<RejectedRow>,
    pub rejected_fixtures: Vec<RejectedRow>,
}

pub fn run_competition(
    data_dir: &Path,
    competition: Competition,
    cfg: &EngineConfig,
) -> Result<CompetitionRun, IngestError> {
    let input = ingest::load_competition(data_dir, competition, cfg)?;
    info!(
        competition = competition.prefix(),
        teams = input.table.records.len(),
        fixtures = input.fixtures.records.len(),
        "loaded competition input"
    );
    let report = build_competition_report(
        competition,
        &input.table.records,
        &input.fixtures.records,
        cfg,
    );
    Ok(CompetitionRun {
        report,
        rejected_teams: input.table.rejected,
        rejected_fixtures: input.fixtures.rejected,
    })
}

/// Competitions share no data, so they are scored in parallel. Results come
/// back in the order requested.
pub fn run_competitions(
    data_dir: &Path,
    competitions: &[Competition],
    cfg: &EngineConfig,
) -> Vec<(Competition, Result<CompetitionRun, IngestError>)> {
    competitions
        .par_iter()
        .map(|&competition| (competition, run_competition(data_dir, competition, cfg)))
        .collect()
}
