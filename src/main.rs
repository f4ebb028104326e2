use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use cup_picks::config::EngineConfig;
use cup_picks::export::{self, CsvLocale};
use cup_picks::logging;
use cup_picks::model::Competition;
use cup_picks::pipeline::{self, CompetitionRun};

#[derive(Debug, Parser)]
#[command(name = "cup_picks")]
#[command(about = "Ranks final-round UEFA league-phase fixtures for fantasy and betting picks")]
struct Cli {
    /// Analyse the Champions League
    #[arg(long)]
    cl: bool,

    /// Analyse the Europa League
    #[arg(long)]
    el: bool,

    /// Write CSV for a Polish Excel (`;` separator, `,` decimal, BOM)
    #[arg(long)]
    excel_pl: bool,

    /// Also write every competition into one .xlsx workbook
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Directory holding champions-league/ and europa-league/
    #[arg(long, env = "CUP_PICKS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Where <prefix>_recommendations.csv files are written
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// TOML file overriding weights, thresholds and aliases
    #[arg(long, env = "CUP_PICKS_CONFIG")]
    config: Option<PathBuf>,

    /// Rows of each ranking printed to the console
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Print scorecards, audit and skipped rows as JSON instead of the console tables
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn competitions(&self) -> Vec<Competition> {
        let run_all = !(self.cl || self.el);
        Competition::ALL
            .into_iter()
            .filter(|c| match c {
                Competition::ChampionsLeague => run_all || self.cl,
                Competition::EuropaLeague => run_all || self.el,
            })
            .collect()
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when at least one competition could not be loaded or saved.
fn run(cli: &Cli) -> Result<bool> {
    let cfg = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let locale = if cli.excel_pl {
        CsvLocale::ExcelPl
    } else {
        CsvLocale::Standard
    };

    let results = pipeline::run_competitions(&cli.data_dir, &cli.competitions(), &cfg);

    let mut all_ok = true;
    let mut runs: Vec<CompetitionRun> = Vec::new();
    for (competition, result) in results {
        match result {
            Ok(run) => runs.push(run),
            Err(err) => {
                all_ok = false;
                error!(competition = competition.prefix(), "{err}");
            }
        }
    }

    if cli.json {
        println!("{}", export::render_json(&runs)?);
    }

    for run in &runs {
        let report = &run.report;
        let label = report.competition.label();

        if !cli.json {
            println!();
            for line in export::audit_lines(label, &report.audit) {
                println!("{line}");
            }
            for rejected in run.rejected_teams.iter().chain(&run.rejected_fixtures) {
                println!(
                    "REJECTED line {} ({}): {}",
                    rejected.line, rejected.label, rejected.error
                );
            }
            for u in &report.unresolved {
                println!(
                    "ERROR: fixture on line {} ({} v {}) skipped, unknown team(s): {}",
                    u.line,
                    u.home,
                    u.away,
                    u.missing.join(", ")
                );
            }
            println!();
            println!("--- {label} TOP {} RECOMMENDATIONS ---", cli.top);
            print!("{}", export::top_table(&report.cards, cli.top));
        }

        let out_path = cli.out_dir.join(report.competition.report_file_name());
        match export::write_csv(&out_path, &report.cards, locale) {
            Ok(summary) => info!(
                path = %out_path.display(),
                rows = summary.rows,
                bytes = summary.bytes,
                sha256 = %summary.sha256,
                "saved report"
            ),
            Err(err) => {
                all_ok = false;
                warn!("FAILED to save {}: {err:#}", out_path.display());
            }
        }
    }

    if let Some(path) = &cli.xlsx {
        let reports: Vec<_> = runs.iter().map(|r| &r.report).collect();
        export::export_workbook(path, &reports)?;
        info!(path = %path.display(), "saved workbook");
    }

    Ok(all_ok)
}
