use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ReconcileConfig;
use crate::model::StageProbabilityRow;

/// Audit verdict of one row. The two flags are independent: a row can be
/// anomalous and stage-violating at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AuditStatus {
    pub sum_over_100: bool,
    pub stage_violation: bool,
}

impl AuditStatus {
    pub const OK: AuditStatus = AuditStatus {
        sum_over_100: false,
        stage_violation: false,
    };

    pub fn is_ok(self) -> bool {
        !self.sum_over_100 && !self.stage_violation
    }

    pub fn labels(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.sum_over_100 {
            out.push("ANOMALY_SUM_OVER_100");
        }
        if self.stage_violation {
            out.push("STAGE_VIOLATION");
        }
        if out.is_empty() {
            out.push("OK");
        }
        out
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels().join("+"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciledProgression {
    /// Percentage in `[0, 100]`, never below the row's quarter-final chance.
    pub top24_probability: f64,
    pub audit_status: AuditStatus,
}

/// Repairs the Top-24 probability of one team.
///
/// The disjoint model (`direct + playoff`) is trusted only while the pair sums
/// to at most 100. Past that the pair is contradictory and the conservative
/// maximum over every stage is used instead. Either way the result is floored
/// at the quarter-final chance, since reaching the quarter-final requires
/// surviving the league phase first.
pub fn reconcile(row: &StageProbabilityRow, cfg: &ReconcileConfig) -> ReconciledProgression {
    let mut audit = AuditStatus::OK;

    let raw_sum = row.direct_qualify + row.playoff_qualify;
    let mut top24 = if raw_sum <= 100.0 + cfg.sum_tolerance {
        raw_sum
    } else {
        audit.sum_over_100 = true;
        [
            row.direct_qualify,
            row.playoff_qualify,
            row.quarterfinal,
            row.semifinal,
            row.final_stage,
            row.winner,
        ]
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max)
    };

    if top24 < row.quarterfinal {
        top24 = row.quarterfinal;
    }

    let top24 = if top24.is_nan() { 0.0 } else { top24.clamp(0.0, 100.0) };

    audit.stage_violation = has_stage_violation(row, cfg.stage_tolerance);

    ReconciledProgression {
        top24_probability: top24,
        audit_status: audit,
    }
}

/// `winner <= final <= semifinal <= quarterfinal`, within `tolerance`.
pub fn has_stage_violation(row: &StageProbabilityRow, tolerance: f64) -> bool {
    let chain = [row.winner, row.final_stage, row.semifinal, row.quarterfinal];
    chain.windows(2).any(|pair| pair[0] > pair[1] + tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(direct: f64, playoff: f64, qf: f64, sf: f64, fin: f64, win: f64) -> StageProbabilityRow {
        StageProbabilityRow {
            direct_qualify: direct,
            playoff_qualify: playoff,
            quarterfinal: qf,
            semifinal: sf,
            final_stage: fin,
            winner: win,
            ..StageProbabilityRow::new("T", "t", 10)
        }
    }

    #[test]
    fn anomaly_scenario_takes_conservative_max() {
        let r = row(93.73, 38.92, 39.05, 20.0, 10.0, 5.0);
        let out = reconcile(&r, &ReconcileConfig::default());
        assert!((out.top24_probability - 93.73).abs() < 1e-9);
        assert!(out.audit_status.sum_over_100);
        assert!(!out.audit_status.stage_violation);
        assert_eq!(out.audit_status.to_string(), "ANOMALY_SUM_OVER_100");
    }

    #[test]
    fn disjoint_sum_is_floored_by_quarterfinal() {
        let r = row(2.28, 15.38, 20.0, 1.0, 0.5, 0.1);
        let out = reconcile(&r, &ReconcileConfig::default());
        assert_eq!(out.top24_probability, 20.0);
        assert!(out.audit_status.is_ok());
    }

    #[test]
    fn disjoint_sum_kept_when_consistent() {
        let r = row(2.28, 15.38, 3.0, 1.0, 0.5, 0.1);
        let out = reconcile(&r, &ReconcileConfig::default());
        assert!((out.top24_probability - 17.66).abs() < 1e-9);
    }

    #[test]
    fn sum_of_exactly_100_is_disjoint() {
        let r = row(60.0, 40.0, 30.0, 10.0, 5.0, 1.0);
        let out = reconcile(&r, &ReconcileConfig::default());
        assert_eq!(out.top24_probability, 100.0);
        assert!(!out.audit_status.sum_over_100);
    }

    #[test]
    fn flags_co_occur() {
        let r = row(80.0, 40.0, 10.0, 30.0, 5.0, 1.0);
        let out = reconcile(&r, &ReconcileConfig::default());
        assert!(out.audit_status.sum_over_100);
        assert!(out.audit_status.stage_violation);
        assert_eq!(
            out.audit_status.to_string(),
            "ANOMALY_SUM_OVER_100+STAGE_VIOLATION"
        );
        assert_eq!(out.top24_probability, 80.0);
    }

    #[test]
    fn stage_audit_does_not_move_top24() {
        // Semi-final above quarter-final: flagged, but only the QF floors Top-24.
        let r = row(10.0, 20.0, 35.0, 50.0, 5.0, 1.0);
        let out = reconcile(&r, &ReconcileConfig::default());
        assert!(out.audit_status.stage_violation);
        assert_eq!(out.top24_probability, 35.0);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let r = row(0.0, 0.0, 130.0, 0.0, 0.0, 0.0);
        let out = reconcile(&r, &ReconcileConfig::default());
        assert_eq!(out.top24_probability, 100.0);
    }
}
