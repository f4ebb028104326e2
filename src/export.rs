use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::audit::AuditSummary;
use crate::ingest::RejectedRow;
use crate::pipeline::CompetitionRun;
use crate::report::{CompetitionReport, MatchScoreCard, UnresolvedFixture};
use crate::status::QualificationStatus;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const SCORECARD_HEADER: [&str; 12] = [
    "Team",
    "Opp",
    "Win%",
    "EV",
    "Mot",
    "Risk",
    "Status",
    "Val",
    "OpMot",
    "OpStatus",
    "Recommendation",
    "Advisory",
];

/// Output locale of the CSV report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvLocale {
    /// `,` separator, `.` decimal, no BOM.
    #[default]
    Standard,
    /// `;` separator, `,` decimal, UTF-8 BOM (what a Polish Excel expects).
    ExcelPl,
}

impl CsvLocale {
    fn delimiter(self) -> u8 {
        match self {
            CsvLocale::Standard => b',',
            CsvLocale::ExcelPl => b';',
        }
    }

    pub fn decimal(self, value: f64, places: usize) -> String {
        let s = format!("{value:.places$}");
        // "-0.0" reads oddly in a spreadsheet.
        let s = if s.starts_with('-') && s.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
            s.trim_start_matches('-').to_string()
        } else {
            s
        };
        match self {
            CsvLocale::Standard => s,
            CsvLocale::ExcelPl => s.replace('.', ","),
        }
    }
}

pub struct ExportReport {
    pub rows: usize,
    pub bytes: usize,
    pub sha256: String,
}

pub fn scorecard_row(card: &MatchScoreCard, locale: CsvLocale) -> Vec<String> {
    vec![
        card.team.clone(),
        card.opponent.clone(),
        locale.decimal(card.win_pct * 100.0, 1),
        locale.decimal(card.ev, 2),
        locale.decimal(card.motivation, 1),
        locale.decimal(card.rotation_risk, 2),
        card.status.to_string(),
        locale.decimal(card.value, 1),
        locale.decimal(card.opp_motivation, 1),
        card.opp_status.to_string(),
        card.recommendation.tier.to_string(),
        card.recommendation
            .advisory
            .map(|a| a.label().to_string())
            .unwrap_or_default(),
    ]
}

/// Serialises the ranked cards. The bytes depend only on the cards and the
/// locale, so identical input yields an identical file.
pub fn render_csv(cards: &[MatchScoreCard], locale: CsvLocale) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if locale == CsvLocale::ExcelPl {
        buf.extend_from_slice(UTF8_BOM);
    }
    {
        let mut writer = WriterBuilder::new()
            .delimiter(locale.delimiter())
            .from_writer(&mut buf);
        writer
            .write_record(SCORECARD_HEADER)
            .context("write csv header")?;
        for card in cards {
            writer
                .write_record(scorecard_row(card, locale))
                .with_context(|| format!("write csv row for {}", card.team))?;
        }
        writer.flush().context("flush csv writer")?;
    }
    Ok(buf)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(out, "{b:02x}");
    }
    out
}

pub fn write_csv(path: &Path, cards: &[MatchScoreCard], locale: CsvLocale) -> Result<ExportReport> {
    let bytes = render_csv(cards, locale)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output dir {}", parent.display()))?;
        }
    }
    fs::write(path, &bytes).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(ExportReport {
        rows: cards.len(),
        bytes: bytes.len(),
        sha256: sha256_hex(&bytes),
    })
}

/// One ranking sheet per competition plus shared `Audit` and `Unresolved`
/// sheets.
pub fn export_workbook(path: &Path, reports: &[&CompetitionReport]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for report in reports {
        let sheet = workbook.add_worksheet();
        sheet.set_name(format!("{} ranking", report.competition.prefix().to_uppercase()))?;
        write_ranking_sheet(sheet, &report.cards, &bold)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Audit")?;
        let mut rows = vec![vec![
            "Competition".to_string(),
            "Team".to_string(),
            "Pos".to_string(),
            "Top24%".to_string(),
            "Audit".to_string(),
            "Status".to_string(),
            "Mot".to_string(),
            "Risk".to_string(),
        ]];
        for report in reports {
            let mut teams: Vec<_> = report.teams.values().collect();
            teams.sort_by_key(|t| t.row.current_position);
            for t in teams {
                rows.push(vec![
                    report.competition.label().to_string(),
                    t.row.team.clone(),
                    t.row.current_position.to_string(),
                    format!("{:.2}", t.progression.top24_probability),
                    t.progression.audit_status.to_string(),
                    t.status.to_string(),
                    format!("{:.1}", t.motivation),
                    format!("{:.2}", t.rotation_risk),
                ]);
            }
        }
        write_rows(sheet, &rows, &bold)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Unresolved")?;
        let mut rows = vec![vec![
            "Competition".to_string(),
            "Line".to_string(),
            "Home".to_string(),
            "Away".to_string(),
            "Missing".to_string(),
        ]];
        for report in reports {
            for u in &report.unresolved {
                rows.push(vec![
                    report.competition.label().to_string(),
                    u.line.to_string(),
                    u.home.clone(),
                    u.away.clone(),
                    u.missing.join(", "),
                ]);
            }
        }
        write_rows(sheet, &rows, &bold)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_ranking_sheet(sheet: &mut Worksheet, cards: &[MatchScoreCard], bold: &Format) -> Result<()> {
    for (col, title) in SCORECARD_HEADER.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *title, bold)
            .with_context(|| format!("write header cell {col}"))?;
    }
    for (idx, card) in cards.iter().enumerate() {
        let row = (idx + 1) as u32;
        let numbers = [
            (2u16, round_to(card.win_pct * 100.0, 1)),
            (3, round_to(card.ev, 2)),
            (4, round_to(card.motivation, 1)),
            (5, round_to(card.rotation_risk, 2)),
            (7, round_to(card.value, 1)),
            (8, round_to(card.opp_motivation, 1)),
        ];
        let strings = [
            (0u16, card.team.clone()),
            (1, card.opponent.clone()),
            (6, card.status.to_string()),
            (9, card.opp_status.to_string()),
            (10, card.recommendation.tier.to_string()),
            (
                11,
                card.recommendation
                    .advisory
                    .map(|a| a.label().to_string())
                    .unwrap_or_default(),
            ),
        ];
        for (col, v) in numbers {
            sheet
                .write_number(row, col, v)
                .with_context(|| format!("write cell ({row},{col})"))?;
        }
        for (col, v) in strings {
            sheet
                .write_string(row, col, &v)
                .with_context(|| format!("write cell ({row},{col})"))?;
        }
    }
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>], bold: &Format) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let written = if row_idx == 0 {
                worksheet.write_string_with_format(row_idx as u32, col_idx as u16, value, bold)
            } else {
                worksheet.write_string(row_idx as u32, col_idx as u16, value)
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Integrity report printed before each ranking.
pub fn audit_lines(label: &str, audit: &AuditSummary) -> Vec<String> {
    let mut lines = vec![format!("--- {label} DATA INTEGRITY REPORT ---")];
    if audit.stage_violations.is_empty() {
        lines.push("OK   Monotonicity (W<=F<=SF<=Q)".to_string());
    } else {
        lines.push(format!(
            "WARN Monotonicity violations ({} teams): {}",
            audit.stage_violations.len(),
            audit.stage_violations.join(", ")
        ));
    }
    if audit.sum_over_100.is_empty() {
        lines.push("OK   Top 24 consistency".to_string());
    } else {
        lines.push(format!(
            "WARN Inconsistent Top 24, sum > 100% ({} teams): {}",
            audit.sum_over_100.len(),
            audit.sum_over_100.join(", ")
        ));
    }
    lines.push(format!(
        "Rows: {} total, {} OK",
        audit.teams,
        audit.ok.len()
    ));
    let statuses = QualificationStatus::ALL
        .iter()
        .map(|s| format!("{s}={}", audit.status_counts.get(s).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(format!("Status: {statuses}"));
    lines.push("-".repeat(30));
    lines
}

/// Fixed-width console table of the best `limit` cards.
pub fn top_table(cards: &[MatchScoreCard], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22} {:<22} {:>6} {:>5} {:>6} {:>5} {:<18} {:>6} {:>6} {:<18} {:<11} {}",
        "Team", "Opp", "Win%", "EV", "Mot", "Risk", "Status", "Val", "OpMot", "OpStatus", "Rec", "Advisory"
    );
    for card in cards.iter().take(limit) {
        let _ = writeln!(
            out,
            "{:<22} {:<22} {:>6.1} {:>5.2} {:>6.1} {:>5.2} {:<18} {:>6.1} {:>6.1} {:<18} {:<11} {}",
            truncate(&card.team, 22),
            truncate(&card.opponent, 22),
            card.win_pct * 100.0,
            card.ev,
            card.motivation,
            card.rotation_risk,
            card.status.as_str(),
            card.value,
            card.opp_motivation,
            card.opp_status.as_str(),
            card.recommendation.tier.label(),
            card.recommendation.advisory.map(|a| a.label()).unwrap_or(""),
        );
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).chain(['…']).collect()
    }
}

#[derive(Serialize)]
struct JsonRejected<'a> {
    line: u64,
    row: &'a str,
    error: String,
}

impl<'a> From<&'a RejectedRow> for JsonRejected<'a> {
    fn from(r: &'a RejectedRow) -> Self {
        Self {
            line: r.line,
            row: &r.label,
            error: r.error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct JsonCompetition<'a> {
    cards: &'a [MatchScoreCard],
    audit: &'a AuditSummary,
    unresolved: &'a [UnresolvedFixture],
    rejected_teams: Vec<JsonRejected<'a>>,
    rejected_fixtures: Vec<JsonRejected<'a>>,
}

/// `--json` output: one object per competition prefix with the ranked cards
/// and everything the console integrity report would show.
pub fn render_json(runs: &[CompetitionRun]) -> Result<String> {
    let out: BTreeMap<&str, JsonCompetition<'_>> = runs
        .iter()
        .map(|run| {
            let report = &run.report;
            (
                report.competition.prefix(),
                JsonCompetition {
                    cards: &report.cards,
                    audit: &report.audit,
                    unresolved: &report.unresolved,
                    rejected_teams: run.rejected_teams.iter().map(JsonRejected::from).collect(),
                    rejected_fixtures: run
                        .rejected_fixtures
                        .iter()
                        .map(JsonRejected::from)
                        .collect(),
                },
            )
        })
        .collect();
    serde_json::to_string_pretty(&out).context("serialize json report")
}
