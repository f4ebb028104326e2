use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AliasMap, EngineConfig};
use crate::model::{Competition, Fixture, LEAGUE_SIZE, StageProbabilityRow};
use crate::names::norm_key;

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing file: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv in {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },
    #[error("{source_name}: missing column {column}")]
    MissingColumn { source_name: String, column: String },
    #[error("{column}: not a number: {value:?}")]
    InvalidNumber { column: String, value: String },
    #[error("{column}: {value} outside [{min}, {max}]")]
    OutOfRange {
        column: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("empty team name in {column}")]
    EmptyTeam { column: String },
    #[error("duplicate team key {key:?}")]
    DuplicateTeam { key: String },
}

/// A data row that failed validation and was left out of the run.
#[derive(Debug)]
pub struct RejectedRow {
    /// 1-based line in the source file (header is line 1).
    pub line: u64,
    pub label: String,
    pub error: IngestError,
}

#[derive(Debug)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug)]
pub struct CompetitionInput {
    pub competition: Competition,
    pub table: Ingested<StageProbabilityRow>,
    pub fixtures: Ingested<Fixture>,
}

/// Header-indexed rows of one delimited file.
#[derive(Debug)]
pub struct RawTable {
    pub source_name: String,
    headers: Vec<String>,
    rows: Vec<(u64, StringRecord)>,
}

impl RawTable {
    fn column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name.trim()))
        })
    }

    fn require(&self, names: &[&str]) -> Result<usize, IngestError> {
        self.column(names).ok_or_else(|| IngestError::MissingColumn {
            source_name: self.source_name.clone(),
            column: names[0].to_string(),
        })
    }
}

/// Picks `;` when the header line contains one, `,` otherwise.
pub fn detect_delimiter(raw: &str) -> u8 {
    let first = raw.lines().next().unwrap_or("");
    if first.contains(';') { b';' } else { b',' }
}

pub fn parse_raw_table(raw: &str, source_name: &str) -> Result<RawTable, IngestError> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let delimiter = detect_delimiter(raw);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(raw.as_bytes());

    let csv_err = |source| IngestError::Csv {
        source_name: source_name.to_string(),
        source,
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push((line, record));
    }

    debug!(
        source = source_name,
        delimiter = %(delimiter as char),
        rows = rows.len(),
        "parsed delimited file"
    );

    Ok(RawTable {
        source_name: source_name.to_string(),
        headers,
        rows,
    })
}

pub fn read_raw_table(path: &Path) -> Result<RawTable, IngestError> {
    if !path.exists() {
        return Err(IngestError::Missing {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = String::from_utf8_lossy(&bytes);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    parse_raw_table(&raw, &name)
}

/// Parses a numeric cell that may use a decimal comma and a trailing `%`.
/// Empty cells read as 0.
pub fn parse_number(column: &str, raw: &str) -> Result<f64, IngestError> {
    let s = raw.trim().trim_end_matches('%').trim();
    if s.is_empty() || s == "-" {
        return Ok(0.0);
    }
    let cleaned = s.replace(',', ".");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(IngestError::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn cell<'a>(record: &'a StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn percent(record: &StringRecord, idx: Option<usize>, column: &str) -> Result<f64, IngestError> {
    let v = parse_number(column, cell(record, idx))?;
    if !(0.0..=100.0).contains(&v) {
        return Err(IngestError::OutOfRange {
            column: column.to_string(),
            value: v,
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(v)
}

fn team_name(record: &StringRecord, idx: usize, column: &str) -> Result<String, IngestError> {
    let name = cell(record, Some(idx)).trim();
    if name.is_empty() {
        return Err(IngestError::EmptyTeam {
            column: column.to_string(),
        });
    }
    Ok(name.to_string())
}

struct TableColumns {
    team: usize,
    position: Option<usize>,
    xpos: Option<usize>,
    xpts: Option<usize>,
    league: Option<usize>,
    playoff: Option<usize>,
    direct: Option<usize>,
    qf: Option<usize>,
    sf: Option<usize>,
    fin: Option<usize>,
    winner: Option<usize>,
}

pub fn table_rows(
    table: &RawTable,
    aliases: &AliasMap,
) -> Result<Ingested<StageProbabilityRow>, IngestError> {
    let cols = TableColumns {
        team: table.require(&["TEAM", "Team"])?,
        position: table.column(&["POS", "#", "POSITION"]),
        xpos: table.column(&["XPOS"]),
        xpts: table.column(&["XPTS"]),
        league: table.column(&["LEAGUE%"]),
        playoff: Some(table.require(&["KO P/0%", "KO P/O%", "KO PO%"])?),
        direct: Some(table.require(&["LAST 16%", "LAST16%"])?),
        qf: Some(table.require(&["QF%"])?),
        sf: table.column(&["SF%"]),
        fin: table.column(&["FINAL%"]),
        winner: table.column(&["WINNER%"]),
    };

    let mut seen = HashSet::new();
    let mut out = Ingested {
        records: Vec::new(),
        rejected: Vec::new(),
    };

    for (order, (line, record)) in table.rows.iter().enumerate() {
        let label = cell(record, Some(cols.team)).trim().to_string();
        match table_row(record, &cols, order, aliases) {
            Ok(row) => {
                if !seen.insert(row.key.clone()) {
                    out.rejected.push(RejectedRow {
                        line: *line,
                        label,
                        error: IngestError::DuplicateTeam { key: row.key },
                    });
                    continue;
                }
                out.records.push(row);
            }
            Err(error) => out.rejected.push(RejectedRow {
                line: *line,
                label,
                error,
            }),
        }
    }
    Ok(out)
}

fn table_row(
    record: &StringRecord,
    cols: &TableColumns,
    order: usize,
    aliases: &AliasMap,
) -> Result<StageProbabilityRow, IngestError> {
    let team = team_name(record, cols.team, "TEAM")?;

    // Without an explicit position column the predicted table order is the standing.
    let position = match cols.position {
        Some(_) => parse_number("POS", cell(record, cols.position))?,
        None => (order + 1) as f64,
    };
    let max_pos = f64::from(LEAGUE_SIZE);
    if position.fract() != 0.0 || !(1.0..=max_pos).contains(&position) {
        return Err(IngestError::OutOfRange {
            column: "POS".to_string(),
            value: position,
            min: 1.0,
            max: max_pos,
        });
    }
    let current_position = position as u8;

    let expected_position = match cols.xpos {
        Some(_) => {
            let v = parse_number("XPOS", cell(record, cols.xpos))?;
            if v == 0.0 { f64::from(current_position) } else { v }
        }
        None => f64::from(current_position),
    };

    Ok(StageProbabilityRow {
        key: norm_key(&team, aliases),
        team,
        current_position,
        expected_position,
        expected_points: parse_number("XPTS", cell(record, cols.xpts))?,
        league_first: percent(record, cols.league, "LEAGUE%")?,
        direct_qualify: percent(record, cols.direct, "LAST 16%")?,
        playoff_qualify: percent(record, cols.playoff, "KO P/0%")?,
        quarterfinal: percent(record, cols.qf, "QF%")?,
        semifinal: percent(record, cols.sf, "SF%")?,
        final_stage: percent(record, cols.fin, "FINAL%")?,
        winner: percent(record, cols.winner, "WINNER%")?,
    })
}

struct FixtureColumns {
    home: usize,
    away: usize,
    home_win: Option<usize>,
    draw: Option<usize>,
    away_win: Option<usize>,
}

pub fn fixture_rows(table: &RawTable, aliases: &AliasMap) -> Result<Ingested<Fixture>, IngestError> {
    let cols = FixtureColumns {
        home: table.require(&["HomeTeam", "Home"])?,
        away: table.require(&["AwayTeam", "Away"])?,
        home_win: Some(table.require(&["HomeWin%"])?),
        draw: Some(table.require(&["Draw%"])?),
        away_win: Some(table.require(&["AwayWin%"])?),
    };

    let mut out = Ingested {
        records: Vec::new(),
        rejected: Vec::new(),
    };
    for (line, record) in &table.rows {
        match fixture_row(record, &cols, aliases) {
            Ok(fixture) => out.records.push(Fixture {
                line: *line,
                ..fixture
            }),
            Err(error) => out.rejected.push(RejectedRow {
                line: *line,
                label: format!(
                    "{} v {}",
                    cell(record, Some(cols.home)).trim(),
                    cell(record, Some(cols.away)).trim()
                ),
                error,
            }),
        }
    }
    Ok(out)
}

fn fixture_row(
    record: &StringRecord,
    cols: &FixtureColumns,
    aliases: &AliasMap,
) -> Result<Fixture, IngestError> {
    let home = team_name(record, cols.home, "HomeTeam")?;
    let away = team_name(record, cols.away, "AwayTeam")?;
    let home_win = percent(record, cols.home_win, "HomeWin%")?;
    let draw = percent(record, cols.draw, "Draw%")?;
    let away_win = percent(record, cols.away_win, "AwayWin%")?;
    let home_key = norm_key(&home, aliases);
    let away_key = norm_key(&away, aliases);
    Ok(Fixture::from_percentages(
        (home, home_key),
        (away, away_key),
        home_win,
        draw,
        away_win,
    ))
}

pub fn competition_dir(data_dir: &Path, competition: Competition) -> PathBuf {
    data_dir.join(competition.data_dir_name())
}

/// Loads and validates both input files of one competition.
pub fn load_competition(
    data_dir: &Path,
    competition: Competition,
    cfg: &EngineConfig,
) -> Result<CompetitionInput, IngestError> {
    let dir = competition_dir(data_dir, competition);
    let table_raw = read_raw_table(&dir.join(competition.table_file_name()))?;
    let fixtures_raw = read_raw_table(&dir.join(competition.fixtures_file_name()))?;

    let table = table_rows(&table_raw, &cfg.aliases)?;
    let fixtures = fixture_rows(&fixtures_raw, &cfg.aliases)?;

    for rejected in table.rejected.iter().chain(fixtures.rejected.iter()) {
        warn!(
            competition = competition.prefix(),
            line = rejected.line,
            row = %rejected.label,
            error = %rejected.error,
            "rejected input row"
        );
    }
    if let Some(expected) = cfg.ingest.expected_teams {
        if table.records.len() != expected {
            warn!(
                competition = competition.prefix(),
                expected,
                found = table.records.len(),
                "unexpected team count"
            );
        }
    }
    if let Some(expected) = cfg.ingest.expected_fixtures {
        if fixtures.records.len() != expected {
            warn!(
                competition = competition.prefix(),
                expected,
                found = fixtures.records.len(),
                "unexpected fixture count"
            );
        }
    }

    Ok(CompetitionInput {
        competition,
        table,
        fixtures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_accepts_decimal_comma_and_percent() {
        assert_eq!(parse_number("x", "93,73").unwrap(), 93.73);
        assert_eq!(parse_number("x", " 12.5% ").unwrap(), 12.5);
        assert_eq!(parse_number("x", "").unwrap(), 0.0);
        assert_eq!(parse_number("x", "-").unwrap(), 0.0);
        assert!(matches!(
            parse_number("x", "abc"),
            Err(IngestError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn delimiter_follows_header_line() {
        assert_eq!(detect_delimiter("TEAM;QF%\nA;1,5"), b';');
        assert_eq!(detect_delimiter("TEAM,QF%\nA,1.5"), b',');
    }

    #[test]
    fn bom_is_ignored_in_headers() {
        let raw = "\u{feff}TEAM,LAST 16%,KO P/0%,QF%\nArsenal,90,10,60\n";
        let table = parse_raw_table(raw, "t.csv").unwrap();
        let rows = table_rows(&table, &AliasMap::empty()).unwrap();
        assert_eq!(rows.records.len(), 1);
        assert_eq!(rows.records[0].team, "Arsenal");
        assert_eq!(rows.records[0].current_position, 1);
    }

    #[test]
    fn semicolon_and_comma_files_parse_the_same() {
        let comma = "TEAM,LAST 16%,KO P/0%,QF%,SF%\nBodø/Glimt,2.5,60.25,10.5,4\nPSV,0,12,1,0.5\n";
        let semi = "TEAM;LAST 16%;KO P/0%;QF%;SF%\nBodø/Glimt;2,5;60,25;10,5;4\nPSV;0;12;1;0,5\n";
        let aliases = AliasMap::default();
        let a = table_rows(&parse_raw_table(comma, "a.csv").unwrap(), &aliases).unwrap();
        let b = table_rows(&parse_raw_table(semi, "b.csv").unwrap(), &aliases).unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(a.records[0].key, "bodo/glimt");
        assert_eq!(a.records[1].current_position, 2);
    }

    #[test]
    fn bad_rows_are_rejected_and_the_rest_kept() {
        let raw = "POS,TEAM,LAST 16%,KO P/0%,QF%\n\
                   1,Arsenal,90,10,60\n\
                   2,Inter,-5,10,5\n\
                   3,,10,10,5\n\
                   40,Ajax,0,10,1\n\
                   5,arsenal,1,1,1\n\
                   6,Monaco,x,10,1\n\
                   ,,,,\n\
                   7,PSV,0,12,1\n";
        let table = parse_raw_table(raw, "t.csv").unwrap();
        let out = table_rows(&table, &AliasMap::empty()).unwrap();
        let kept: Vec<&str> = out.records.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(kept, ["Arsenal", "PSV"]);

        let lines: Vec<u64> = out.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, [3, 4, 5, 6, 7]);
        assert!(matches!(out.rejected[0].error, IngestError::OutOfRange { .. }));
        assert!(matches!(out.rejected[1].error, IngestError::EmptyTeam { .. }));
        assert!(matches!(out.rejected[2].error, IngestError::OutOfRange { .. }));
        assert!(matches!(out.rejected[3].error, IngestError::DuplicateTeam { .. }));
        assert!(matches!(out.rejected[4].error, IngestError::InvalidNumber { .. }));
    }

    #[test]
    fn fixture_probabilities_are_normalised() {
        let raw = "HomeTeam;AwayTeam;HomeWin%;Draw%;AwayWin%\nReal;Monaco;50;25;25\nA;B;;;\n";
        let out = fixture_rows(&parse_raw_table(raw, "f.csv").unwrap(), &AliasMap::default()).unwrap();
        assert_eq!(out.records.len(), 2);
        let f = &out.records[0];
        assert_eq!(f.home_key, "real madrid");
        assert!((f.home_win + f.draw + f.away_win - 1.0).abs() < 1e-12);
        assert!((f.home_win - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let table = parse_raw_table("TEAM,QF%\nA,1\n", "t.csv").unwrap();
        let err = table_rows(&table, &AliasMap::empty()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { .. }));
    }
}
