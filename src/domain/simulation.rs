//! Day-by-day simulation engine.
//!
//! The engine walks the days of a [`SimulationWindow`] in order. Each day is
//! handed to the run variant chosen at construction:
//!
//! - [`SimulateRun`] scores candidates, realizes the allocator's trading list
//!   and compounds the day's gain into the [`EquityLedger`];
//! - [`ExportRun`] collects labeled feature rows for model training.
//!
//! A cancellation flag is polled between days. Whether the loop completes or
//! is cancelled, the same `finish` step flushes the state as it stands.

use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::allocation::{is_outlier_gain, normalize_trading_list, Candidate};
use super::date_axis::DateAxis;
use super::error::SimError;
use super::features::MlFeatures;
use super::ledger::{period_buckets, EquityLedger, TOTAL_BUCKET};
use super::report::{build_chart, BenchmarkSeries, DayReport, DayTotals, RunSummary, TradeLine};
use super::series_store::{SeriesStore, SimulationWindow, TradingDay};
use super::trade_record::TradeRecord;
use crate::ports::export_port::ExportPort;
use crate::ports::report_port::ReportPort;
use crate::ports::scoring_port::{AllocationPort, ScoringPort};

/// Exit status reported after an interrupted run (128 + SIGINT).
pub const INTERRUPTED_EXIT_STATUS: u8 = 130;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Sessions of history required before the first buy day.
    pub lookback_days: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            start_date: None,
            end_date: None,
            lookback_days: MlFeatures::LOOKBACK,
        }
    }
}

/// Mutable state of a run, owned by the engine and threaded through each day.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub ledger: EquityLedger,
    pub win_trades: usize,
    pub lose_trades: usize,
    pub records: Vec<TradeRecord>,
    pub days_processed: usize,
}

impl SimulationState {
    pub fn new(total_seed: NaiveDate) -> Self {
        Self {
            ledger: EquityLedger::new(total_seed),
            win_trades: 0,
            lose_trades: 0,
            records: Vec::new(),
            days_processed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Init,
    Running,
    Flushed,
    Summarized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Interrupted,
}

impl RunOutcome {
    pub fn exit_status(self) -> u8 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Interrupted => INTERRUPTED_EXIT_STATUS,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub phase: EnginePhase,
    pub summary: Option<RunSummary>,
    pub export_path: Option<PathBuf>,
    pub exported_rows: usize,
}

/// Trade simulation: score, allocate, realize, compound.
pub struct SimulateRun<'a> {
    pub scorer: &'a dyn ScoringPort,
    pub allocator: &'a dyn AllocationPort,
    pub benchmarks: Vec<BenchmarkSeries>,
}

/// Feature/label harvesting for model training.
pub struct ExportRun<'a> {
    pub exporter: &'a dyn ExportPort,
}

pub enum EngineRun<'a> {
    Simulate(SimulateRun<'a>),
    Export(ExportRun<'a>),
}

impl SimulateRun<'_> {
    fn advance(&self, day: &TradingDay, axis: &DateAxis, state: &mut SimulationState) -> DayReport {
        let candidates: Vec<Candidate> = day
            .candidates
            .iter()
            .map(|c| Candidate {
                symbol: c.symbol.clone(),
                features: c.features,
            })
            .collect();
        let scored = self.scorer.score_all(&candidates);
        let mut trading_list = self.allocator.allocate(&scored);
        if normalize_trading_list(&mut trading_list) {
            warn!(date = %day.sell_date, "allocator proportions out of contract, rescaled");
        }

        let mut lines = Vec::new();
        let mut daily_gain = 0.0;
        for entry in &trading_list {
            if entry.proportion == 0.0 {
                continue;
            }
            let Some(candidate) = day.candidate(&entry.symbol) else {
                debug!(symbol = %entry.symbol, "allocated symbol is not a candidate today");
                continue;
            };
            let mut line = TradeLine {
                symbol: entry.symbol.clone(),
                proportion: entry.proportion,
                weight: entry.weight,
                side: entry.side,
                today_change: candidate.today_change,
                buy_price: candidate.buy_price,
                sell_price: None,
                gain: None,
            };
            if day.preview {
                lines.push(line);
                continue;
            }
            let Some(raw_gain) = candidate.gain else {
                debug!(symbol = %entry.symbol, date = %day.sell_date, "no sell price");
                continue;
            };
            if is_outlier_gain(raw_gain) {
                debug!(symbol = %entry.symbol, gain = raw_gain, "skipping probable split");
                continue;
            }
            let gain = entry.side.signed_gain(raw_gain);
            if gain > 0.0 {
                state.win_trades += 1;
            } else if gain < 0.0 {
                state.lose_trades += 1;
            }
            daily_gain += gain * entry.proportion;
            line.sell_price = candidate.sell_price;
            line.gain = Some(gain);
            lines.push(line);
        }

        let totals = if day.preview {
            None
        } else {
            state.ledger.record_day(day.sell_date, daily_gain, axis);
            let (quarter, year) = period_buckets(day.sell_date);
            let ledger = &state.ledger;
            Some(DayTotals {
                daily_gain,
                quarter_gain: ledger.final_gain(&quarter).unwrap_or(0.0),
                year_gain: ledger.final_gain(&year).unwrap_or(0.0),
                total_gain: ledger.final_gain(TOTAL_BUCKET).unwrap_or(0.0),
                win_trades: state.win_trades,
                lose_trades: state.lose_trades,
            })
        };

        DayReport {
            sell_date: day.sell_date,
            preview: day.preview,
            lines,
            totals,
        }
    }
}

impl ExportRun<'_> {
    fn advance(&self, day: &TradingDay, state: &mut SimulationState) {
        if day.preview {
            return;
        }
        for candidate in &day.candidates {
            let (Some(features), Some(gain)) = (candidate.features, candidate.gain) else {
                continue;
            };
            if is_outlier_gain(gain) {
                debug!(symbol = %candidate.symbol, gain, "skipping probable split");
                continue;
            }
            state.records.push(TradeRecord {
                symbol: candidate.symbol.clone(),
                date: day.sell_date,
                features,
                gain,
            });
        }
    }
}

/// `data_2021.csv` for a single-year window, `data_2020_2021.csv` otherwise.
pub fn export_file_name(start_date: NaiveDate, end_date: NaiveDate) -> String {
    let (start_year, end_year) = (start_date.year(), end_date.year());
    if start_year == end_year {
        format!("data_{start_year}.csv")
    } else {
        format!("data_{start_year}_{end_year}.csv")
    }
}

pub struct SimulationEngine<'a> {
    store: SeriesStore,
    window: SimulationWindow,
    run: EngineRun<'a>,
    state: SimulationState,
    phase: EnginePhase,
    finished: Option<RunReport>,
}

impl<'a> SimulationEngine<'a> {
    /// Resolves the window up front; a start date without enough look-back
    /// fails here, before any day is simulated.
    pub fn new(
        store: SeriesStore,
        config: &SimulationConfig,
        run: EngineRun<'a>,
    ) -> Result<Self, SimError> {
        let window = store.plan_window(config.start_date, config.end_date, config.lookback_days)?;
        let seed = store.axis().seed_date(window.start_date);
        Ok(Self {
            store,
            window,
            run,
            state: SimulationState::new(seed),
            phase: EnginePhase::Init,
            finished: None,
        })
    }

    pub fn window(&self) -> &SimulationWindow {
        &self.window
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Runs every remaining day unless `cancel` is raised, then flushes.
    pub fn run(
        &mut self,
        report: &mut dyn ReportPort,
        cancel: &AtomicBool,
    ) -> Result<RunReport, SimError> {
        if let Some(done) = &self.finished {
            return Ok(done.clone());
        }
        self.phase = EnginePhase::Running;
        info!(
            days = self.window.days.len(),
            start = %self.window.start_date,
            end = %self.window.end_date,
            "simulation started"
        );

        let days = self.window.days.clone();
        for day in days {
            if cancel.load(Ordering::SeqCst) {
                info!(processed = self.state.days_processed, "interrupted, flushing partial results");
                return self.finish(report, RunOutcome::Interrupted);
            }
            if let Err(e) = report.begin_day(day.sell_date(), day.is_preview()) {
                warn!(date = %day.sell_date(), error = %e, "failed to report day start");
            }
            let trading_day = self.store.trading_day(day);
            match &self.run {
                EngineRun::Simulate(run) => {
                    let day_report = run.advance(&trading_day, self.store.axis(), &mut self.state);
                    if let Err(e) = report.write_day(&day_report) {
                        warn!(date = %day_report.sell_date, error = %e, "failed to write day report");
                    }
                }
                EngineRun::Export(run) => run.advance(&trading_day, &mut self.state),
            }
            self.state.days_processed += 1;
        }
        self.finish(report, RunOutcome::Completed)
    }

    /// End-of-run transition shared by the normal and the interrupted path.
    /// Serializes the state without mutating the ledger.
    fn finish(
        &mut self,
        report: &mut dyn ReportPort,
        outcome: RunOutcome,
    ) -> Result<RunReport, SimError> {
        let done = match &self.run {
            EngineRun::Export(run) => {
                let name = export_file_name(self.window.start_date, self.window.end_date);
                let path = run.exporter.write_records(&name, &self.state.records)?;
                info!(rows = self.state.records.len(), path = %path.display(), "features exported");
                RunReport {
                    outcome,
                    phase: EnginePhase::Flushed,
                    summary: None,
                    export_path: Some(path),
                    exported_rows: self.state.records.len(),
                }
            }
            EngineRun::Simulate(run) => {
                let ledger = &self.state.ledger;
                let summary = RunSummary {
                    start_date: self.window.start_date,
                    end_date: self.window.end_date,
                    bucket_gains: ledger.final_gains(),
                    win_trades: self.state.win_trades,
                    lose_trades: self.state.lose_trades,
                    days: ledger.curve(TOTAL_BUCKET).map(|c| c.days()).unwrap_or(0),
                    interrupted: outcome == RunOutcome::Interrupted,
                };
                report.write_summary(&summary)?;
                for (bucket, curve) in ledger.buckets() {
                    let chart = build_chart(bucket, curve, &run.benchmarks);
                    if let Err(e) = report.write_chart(&chart) {
                        warn!(bucket, error = %e, "failed to write equity chart");
                    }
                }
                RunReport {
                    outcome,
                    phase: EnginePhase::Summarized,
                    summary: Some(summary),
                    export_path: None,
                    exported_rows: 0,
                }
            }
        };
        self.phase = done.phase;
        self.finished = Some(done.clone());
        Ok(done)
    }
}
