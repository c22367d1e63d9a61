//! Core backtesting components.
//!
//! This module provides the fundamental types for backtesting:
//! - `Tick` / `QuoteTick`: market data the strategies consume.
//! - `Order`: market and limit orders.
//! - `Ledger`: cash, position and pending orders of one strategy.
//! - `BarAggregator`: groups trades into OHLCV bars.
//! - `BacktestEngine`: runs every registered strategy in parallel over the shared data.

mod bar;
mod ledger;
mod order;
mod tick;
mod timeframe;

use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rayon::prelude::*;

use crate::errors::{Error, Result};
use crate::metrics::{StatsCollector, StatsMap, register_standard_metrics};
use crate::report::{OutputSink, export_run_csv, write_report};
use crate::strategy::StrategyKind;

pub use bar::*;
pub use ledger::*;
pub use order::*;
pub use tick::*;
pub use timeframe::*;

#[cfg(test)]
mod scenarios;

/// One strategy together with the ledger and statistics it exclusively owns.
#[derive(Debug)]
pub struct StrategyContext {
    name: String,
    strategy: StrategyKind,
    time_frame: TimeFrame,
    ledger: Ledger,
    statistics: StatsCollector,
}

impl StrategyContext {
    /// Name the strategy was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of events the strategy consumes.
    pub fn kind(&self) -> EventKind {
        self.strategy.kind()
    }

    /// Time frame the metrics are annualized for.
    pub fn time_frame(&self) -> TimeFrame {
        self.time_frame
    }

    /// The strategy's ledger, as it stands before the run.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Gives access to the collector, e.g. to register additional metrics before the run.
    pub fn statistics_mut(&mut self) -> &mut StatsCollector {
        &mut self.statistics
    }

    fn run(self, ticks: &[Tick], quotes: &[QuoteTick], output: &RunOutput) -> Result<RunReport> {
        let Self {
            name,
            mut strategy,
            time_frame,
            mut ledger,
            mut statistics,
        } = self;

        let kind = strategy.kind();
        let events = match kind {
            EventKind::Trade => ticks.len(),
            EventKind::Quote => quotes.len(),
        };
        if events == 0 {
            return Err(Error::NoEventData { strategy: name, kind });
        }

        tracing::info!(strategy = %name, %kind, events, "starting run");
        strategy.on_start(&mut ledger);

        match &mut strategy {
            StrategyKind::Trade(trader) => {
                for tick in ticks {
                    trader.on_tick(tick, &mut ledger);
                    ledger.match_trade(tick);
                    statistics.record(ledger.valuation(tick.price()));
                }
            }
            StrategyKind::Quote(quoter) => {
                for quote in quotes {
                    quoter.on_quote(quote, &mut ledger);
                    ledger.match_quote(quote);
                    statistics.record(ledger.valuation(quote.mid()));
                }
            }
        }

        strategy.on_end(&mut ledger);
        let metrics = statistics.compute_all();

        let report = RunReport {
            final_valuation: statistics.values().last().copied().unwrap_or(ledger.initial_cash()),
            kind,
            time_frame,
            initial_cash: ledger.initial_cash(),
            cash: ledger.cash(),
            position: ledger.position(),
            fills: ledger.fills(),
            discarded_orders: ledger.pending_orders().count(),
            values: statistics.values().to_vec(),
            metrics,
            name,
        };
        tracing::info!(
            strategy = %report.name,
            valuation = report.final_valuation,
            fills = report.fills,
            "run finished"
        );

        // The run itself succeeded; output failures are logged, not returned.
        if let Some(sink) = &output.sink {
            if let Err(e) = write_report(sink, &report) {
                tracing::error!(strategy = %report.name, error = %e, "report output failed");
            }
        }
        if let Some(dir) = &output.csv_dir {
            if let Err(e) = export_run_csv(dir, &report) {
                tracing::error!(strategy = %report.name, dir = %dir.display(), error = %e, "csv export failed");
            }
        }

        Ok(report)
    }
}

/// Outcome of one strategy's run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Name the strategy was registered under.
    pub name: String,
    /// Kind of events the strategy consumed.
    pub kind: EventKind,
    /// Time frame the metrics were annualized for.
    pub time_frame: TimeFrame,
    /// Cash the ledger was opened with.
    pub initial_cash: f64,
    /// Cash at the end of the run.
    pub cash: f64,
    /// Position at the end of the run.
    pub position: f64,
    /// Last mark-to-market valuation recorded.
    pub final_valuation: f64,
    /// Number of executed orders.
    pub fills: usize,
    /// Limit orders still pending at the end, dropped without execution.
    pub discarded_orders: usize,
    /// Valuation after every event.
    pub values: Vec<f64>,
    /// Standard and custom metrics; empty when fewer than two events were processed.
    pub metrics: StatsMap,
}

#[derive(Debug, Default)]
struct RunOutput {
    sink: Option<OutputSink>,
    csv_dir: Option<PathBuf>,
}

/// Runs registered strategies concurrently over shared trade and quote series.
///
/// Each strategy gets a fresh [`Ledger`] and [`StatsCollector`] at registration, and runs on its
/// own task. The series are only read during a run.
#[derive(Debug, Default)]
pub struct BacktestEngine {
    ticks: Arc<[Tick]>,
    quotes: Arc<[QuoteTick]>,
    contexts: Vec<StrategyContext>,
    risk_free_rate: f64,
    output: RunOutput,
}

impl BacktestEngine {
    /// Creates an engine with no data and no strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the trade series.
    pub fn set_ticks(&mut self, ticks: impl Into<Arc<[Tick]>>) {
        self.ticks = ticks.into();
    }

    /// Replaces the quote series.
    pub fn set_quotes(&mut self, quotes: impl Into<Arc<[QuoteTick]>>) {
        self.quotes = quotes.into();
    }

    /// The trade series.
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// The quote series.
    pub fn quotes(&self) -> &[QuoteTick] {
        &self.quotes
    }

    /// Per-period risk-free rate used by the Sharpe and Sortino ratios of strategies registered
    /// afterwards.
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Prints every report to `sink` as soon as its run finishes.
    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.output.sink = Some(sink);
        self
    }

    /// Writes `<name>_pnl.csv` and `<name>_statistics.csv` into `dir` after every run.
    pub fn with_csv_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.csv_dir = Some(dir.into());
        self
    }

    /// Registers a strategy with its own ledger holding `initial_cash` and the standard metrics
    /// annualized for `time_frame`.
    ///
    /// Names identify reports and exported files, so they must be unique among the registered
    /// strategies and usable as a file name.
    ///
    /// ### Returns
    /// The new context, for further setup such as custom metrics, or
    /// [`Error::InvalidStrategyName`] / [`Error::DuplicateStrategy`].
    pub fn add_strategy(
        &mut self,
        name: impl Into<String>,
        strategy: StrategyKind,
        time_frame: TimeFrame,
        initial_cash: f64,
    ) -> Result<&mut StrategyContext> {
        let name = name.into();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::InvalidStrategyName(name));
        }
        if self.contexts.iter().any(|context| context.name == name) {
            return Err(Error::DuplicateStrategy(name));
        }

        let mut statistics = StatsCollector::new();
        register_standard_metrics(&mut statistics, time_frame, self.risk_free_rate);
        tracing::debug!(strategy = %name, kind = %strategy.kind(), %time_frame, initial_cash, "strategy registered");

        let index = self.contexts.len();
        self.contexts.push(StrategyContext {
            name,
            strategy,
            time_frame,
            ledger: Ledger::new(initial_cash),
            statistics,
        });
        Ok(&mut self.contexts[index])
    }

    /// Strategies registered since the last run, in registration order.
    pub fn strategies(&self) -> std::slice::Iter<'_, StrategyContext> {
        self.contexts.iter()
    }

    /// Runs every registered strategy to completion, one task each, and waits for all of them.
    ///
    /// Registered strategies are consumed: a second call runs nothing until new ones are added.
    ///
    /// ### Returns
    /// One result per strategy, in registration order. A strategy whose event series is empty
    /// yields [`Error::NoEventData`] without affecting the others.
    pub fn run_all(&mut self) -> Vec<Result<RunReport>> {
        let contexts = std::mem::take(&mut self.contexts);
        let (ticks, quotes, output) = (&*self.ticks, &*self.quotes, &self.output);

        contexts
            .into_par_iter()
            .map(|context| {
                let name = context.name.clone();
                context.run(ticks, quotes, output).inspect_err(|e| {
                    tracing::error!(strategy = %name, error = %e, "run failed");
                })
            })
            .collect()
    }
}
