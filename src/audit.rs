use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::report::TeamAssessment;
use crate::status::QualificationStatus;

/// Per-competition tally of reconciler verdicts and statuses.
///
/// Team lists hold display names in standings order. A team can appear in
/// both `sum_over_100` and `stage_violations`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditSummary {
    pub teams: usize,
    pub ok: Vec<String>,
    pub sum_over_100: Vec<String>,
    pub stage_violations: Vec<String>,
    pub status_counts: BTreeMap<QualificationStatus, usize>,
}

impl AuditSummary {
    pub fn from_assessments<'a>(assessments: impl IntoIterator<Item = &'a TeamAssessment>) -> Self {
        let mut sorted: Vec<&TeamAssessment> = assessments.into_iter().collect();
        sorted.sort_by(|a, b| {
            a.row
                .current_position
                .cmp(&b.row.current_position)
                .then_with(|| a.row.team.cmp(&b.row.team))
        });

        let mut out = AuditSummary {
            teams: sorted.len(),
            ..AuditSummary::default()
        };
        for status in QualificationStatus::ALL {
            out.status_counts.insert(status, 0);
        }

        for a in sorted {
            let audit = a.progression.audit_status;
            if audit.is_ok() {
                out.ok.push(a.row.team.clone());
            }
            if audit.sum_over_100 {
                out.sum_over_100.push(a.row.team.clone());
            }
            if audit.stage_violation {
                out.stage_violations.push(a.row.team.clone());
            }
            *out.status_counts.entry(a.status).or_insert(0) += 1;
        }
        out
    }

    pub fn is_clean(&self) -> bool {
        self.sum_over_100.is_empty() && self.stage_violations.is_empty()
    }
}
