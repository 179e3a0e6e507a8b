//! CLI definition and dispatch.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::feature_csv_adapter::FeatureCsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_report::FileReportAdapter;
use crate::adapters::interrupt::install_interrupt_flag;
use crate::adapters::log_report::LogReportAdapter;
use crate::domain::allocation::RankAllocator;
use crate::domain::config_validation::{lookback_days, parse_optional_date, validate_simulation_config};
use crate::domain::error::SimError;
use crate::domain::features::DAYS_IN_A_YEAR;
use crate::domain::report::BenchmarkSeries;
use crate::domain::scoring::{LinearModelScorer, MomentumScorer};
use crate::domain::series_store::{PriceTable, ReplayTable, SeriesStore};
use crate::domain::simulation::{
    EngineRun, ExportRun, RunOutcome, RunReport, SimulateRun, SimulationConfig, SimulationEngine,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::scoring_port::ScoringPort;

#[derive(Parser, Debug)]
#[command(name = "dailysim", about = "Daily next-day stock trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation, or export features with --write-data
    Simulate(SimulateArgs),
    /// Validate a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// First sell date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// Last sell date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
    /// Linear model file used for scoring
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Replay exported feature files instead of computing from prices
    #[arg(long, num_args = 1..)]
    pub data_files: Vec<PathBuf>,
    /// Export labeled feature rows instead of simulating trades
    #[arg(long)]
    pub write_data: bool,
}

/// Everything a run needs, resolved from the config file and CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub lookback_days: usize,
    pub max_positions: usize,
    pub allow_short: bool,
    pub min_score: f64,
    pub prices_dir: PathBuf,
    pub symbols: Vec<String>,
    pub export_dir: PathBuf,
    pub history_years: i32,
    pub output_dir: PathBuf,
    pub benchmarks: Vec<String>,
    pub model: Option<PathBuf>,
    pub data_files: Vec<PathBuf>,
    pub write_data: bool,
}

/// What a completed [`run_simulation`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub report: RunReport,
    pub output_dir: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate(args) => run_simulate(&args),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn empty_config() -> Result<FileConfigAdapter, SimError> {
    FileConfigAdapter::from_string("").map_err(|reason| SimError::ConfigParse {
        file: "<defaults>".into(),
        reason,
    })
}

fn non_negative(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<usize, SimError> {
    usize::try_from(config.get_int(section, key, default)).map_err(|_| SimError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: format!("{} must be non-negative", key),
    })
}

pub fn build_settings(config: &dyn ConfigPort, args: &SimulateArgs) -> Result<RunSettings, SimError> {
    let start_date = match args.start_date {
        Some(d) => Some(d),
        None => parse_optional_date(config, "simulate", "start_date")?,
    };
    let end_date = match args.end_date {
        Some(d) => Some(d),
        None => parse_optional_date(config, "simulate", "end_date")?,
    };
    if let (Some(s), Some(e)) = (start_date, end_date) {
        if s > e {
            return Err(SimError::ConfigInvalid {
                section: "simulate".into(),
                key: "start_date".into(),
                reason: format!("start_date {} is after end_date {}", s, e),
            });
        }
    }

    let path_or = |key: &str, default: &str| {
        PathBuf::from(config.get_string("data", key).unwrap_or_else(|| default.to_string()))
    };

    Ok(RunSettings {
        start_date,
        end_date,
        lookback_days: lookback_days(config)?,
        max_positions: non_negative(config, "simulate", "max_positions", 5)?.max(1),
        allow_short: config.get_bool("simulate", "allow_short", false),
        min_score: config.get_double("simulate", "min_score", 0.0),
        prices_dir: path_or("prices_dir", "data/prices"),
        symbols: config.get_list("data", "symbols"),
        export_dir: path_or("export_dir", "data"),
        history_years: config.get_int("data", "history_years", 3).max(1) as i32,
        output_dir: PathBuf::from(
            config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| "outputs/simulate".to_string()),
        ),
        benchmarks: match config.get_string("report", "benchmarks") {
            Some(_) => config.get_list("report", "benchmarks"),
            None => vec!["QQQ".into(), "SPY".into(), "TQQQ".into()],
        },
        model: args.model.clone(),
        data_files: args.data_files.clone(),
        write_data: args.write_data,
    })
}

/// Price window to fetch: whole years covering the start date plus the
/// feature look-back, or the last `history_years` when no start is given.
pub fn history_range(settings: &RunSettings, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let from_year = match settings.start_date {
        Some(start) => start.year() - (settings.lookback_days / DAYS_IN_A_YEAR) as i32 - 1,
        None => today.year() - settings.history_years,
    };
    let from = NaiveDate::from_ymd_opt(from_year, 1, 1).unwrap_or(NaiveDate::MIN);
    (from, settings.end_date.unwrap_or(today))
}

/// Loads every symbol's history; symbols that fail to load are skipped.
pub fn load_price_store(
    data_port: &dyn DataPort,
    symbols: &[String],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<SeriesStore, SimError> {
    let mut history = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match data_port.fetch_ohlcv(symbol, from, to) {
            Ok(bars) if bars.is_empty() => warn!(%symbol, "no bars in range, skipping"),
            Ok(bars) => history.push((symbol.clone(), bars)),
            Err(e) => warn!(%symbol, error = %e, "skipping symbol"),
        }
    }
    if history.is_empty() {
        return Err(SimError::NoData);
    }
    info!(symbols = history.len(), %from, %to, "price history loaded");
    Ok(SeriesStore::Computed(PriceTable::from_bars(history)))
}

/// Benchmarks that fail to load are omitted.
pub fn load_benchmarks(
    data_port: &dyn DataPort,
    symbols: &[String],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<BenchmarkSeries> {
    symbols
        .iter()
        .filter_map(|symbol| match data_port.fetch_ohlcv(symbol, from, to) {
            Ok(bars) if !bars.is_empty() => Some(BenchmarkSeries {
                symbol: symbol.clone(),
                closes: bars
                    .iter()
                    .filter(|b| b.has_valid_close())
                    .map(|b| (b.date, b.close))
                    .collect(),
            }),
            Ok(_) => {
                warn!(%symbol, "benchmark has no data, omitted");
                None
            }
            Err(e) => {
                warn!(%symbol, error = %e, "benchmark unavailable, omitted");
                None
            }
        })
        .collect()
}

fn load_scorer(model: Option<&Path>) -> Result<Box<dyn ScoringPort>, SimError> {
    match model {
        Some(path) => {
            let config = FileConfigAdapter::from_file(path).map_err(|e| SimError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let scorer = LinearModelScorer::from_config(&config)?;
            info!(model = %path.display(), "linear model loaded");
            Ok(Box::new(scorer))
        }
        None => Ok(Box::new(MomentumScorer)),
    }
}

/// Loads data, builds the engine and runs it to completion or cancellation.
pub fn run_simulation(
    data_port: &dyn DataPort,
    settings: &RunSettings,
    cancel: &AtomicBool,
    started_at: NaiveDateTime,
) -> Result<SimulationOutput, SimError> {
    // Stage 1: series store
    let (store, end_date) = if settings.data_files.is_empty() {
        let (from, to) = history_range(settings, started_at.date());
        let symbols = if settings.symbols.is_empty() {
            data_port.list_symbols()?
        } else {
            settings.symbols.clone()
        };
        let universe: Vec<String> = symbols
            .into_iter()
            .filter(|s| !settings.benchmarks.contains(s) || settings.symbols.contains(s))
            .collect();
        // without an end date the run closes on the would-buy day after the last close
        (load_price_store(data_port, &universe, from, to)?, Some(to))
    } else {
        let records = FeatureCsvAdapter::read_files(&settings.data_files)?;
        (
            SeriesStore::Replay(ReplayTable::from_records(records)),
            settings.end_date,
        )
    };

    let config = SimulationConfig {
        start_date: settings.start_date,
        end_date,
        lookback_days: settings.lookback_days,
    };

    // Stage 2: export run
    if settings.write_data {
        let exporter = FeatureCsvAdapter::new(settings.export_dir.clone());
        let run = EngineRun::Export(ExportRun { exporter: &exporter });
        let mut engine = SimulationEngine::new(store, &config, run)?;
        let mut sink = LogReportAdapter::new();
        let report = engine.run(&mut sink, cancel)?;
        return Ok(SimulationOutput {
            report,
            output_dir: None,
        });
    }

    // Stage 3: simulate run
    let scorer = load_scorer(settings.model.as_deref())?;
    let allocator = RankAllocator {
        max_positions: settings.max_positions,
        allow_short: settings.allow_short,
        min_score: settings.min_score,
    };
    let window = store.plan_window(config.start_date, config.end_date, config.lookback_days)?;
    let bench_from = store.axis().seed_date(window.start_date);
    let benchmarks = load_benchmarks(data_port, &settings.benchmarks, bench_from, window.end_date);
    let run = EngineRun::Simulate(SimulateRun {
        scorer: scorer.as_ref(),
        allocator: &allocator,
        benchmarks,
    });
    let mut engine = SimulationEngine::new(store, &config, run)?;
    let mut sink = FileReportAdapter::create(&settings.output_dir, started_at)?;
    let report = engine.run(&mut sink, cancel)?;
    Ok(SimulationOutput {
        report,
        output_dir: Some(sink.output_dir().to_path_buf()),
    })
}

fn print_console_summary(output: &SimulationOutput) {
    let report = &output.report;
    if report.outcome == RunOutcome::Interrupted {
        eprintln!("\nInterrupted: results below cover the days completed so far.");
    }
    if let Some(path) = &report.export_path {
        eprintln!("\nExported {} rows to {}", report.exported_rows, path.display());
    }
    if let Some(summary) = &report.summary {
        eprintln!(
            "\n=== Results {} to {} ({} days) ===",
            summary.start_date, summary.end_date, summary.days
        );
        for (bucket, gain) in &summary.bucket_gains {
            eprintln!("  {:<10} {:+.2}%", bucket, gain * 100.0);
        }
        eprintln!(
            "Win Trades: {}  Lose Trades: {}",
            summary.win_trades, summary.lose_trades
        );
    }
    if let Some(dir) = &output.output_dir {
        eprintln!("\nReport written to: {}", dir.display());
    }
}

fn run_simulate(args: &SimulateArgs) -> ExitCode {
    // Stage 1: load config
    let adapter = match &args.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            }
        }
        None => match empty_config() {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    // Stage 2: validate and resolve settings
    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let settings = match build_settings(&adapter, args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: run
    let cancel = install_interrupt_flag();
    let data_port = CsvAdapter::new(settings.prices_dir.clone());
    match run_simulation(&data_port, &settings, &cancel, Local::now().naive_local()) {
        Ok(output) => {
            print_console_summary(&output);
            ExitCode::from(output.report.outcome.exit_status())
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let settings = match build_settings(&adapter, &SimulateArgs::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let show_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "(auto)".into());
    eprintln!("\nSimulation:");
    eprintln!("  start_date:    {}", show_date(settings.start_date));
    eprintln!("  end_date:      {}", show_date(settings.end_date));
    eprintln!("  lookback_days: {}", settings.lookback_days);
    eprintln!("  max_positions: {}", settings.max_positions);
    eprintln!("  allow_short:   {}", settings.allow_short);
    eprintln!("  min_score:     {}", settings.min_score);
    eprintln!("\nData:");
    eprintln!("  prices_dir:    {}", settings.prices_dir.display());
    if settings.symbols.is_empty() {
        eprintln!("  symbols:       (every file in prices_dir)");
    } else {
        eprintln!("  symbols:       {}", settings.symbols.join(", "));
    }
    eprintln!("  export_dir:    {}", settings.export_dir.display());
    eprintln!("\nReport:");
    eprintln!("  output_dir:    {}", settings.output_dir.display());
    eprintln!("  benchmarks:    {}", settings.benchmarks.join(", "));

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
