//! Performance statistics for backtesting.
//!
//! A [`StatsCollector`] records one valuation per processed event and derives the return series on
//! the fly. Metrics are registered by name as functions over the finished [`Series`] and evaluated
//! once, by [`StatsCollector::compute_all`], when the run is over.
//!
//! [`register_standard_metrics`] installs:
//! - Mean return
//! - Total return
//! - Max drawdown
//! - Annualized volatility
//! - Sharpe ratio
//! - Sortino ratio

use std::collections::BTreeMap;
use std::fmt;

use crate::engine::TimeFrame;
use crate::utils::{mean, population_variance};

/// Added to the previous value when computing a return, so a zero valuation does not divide by zero.
pub const RETURN_EPSILON: f64 = 1e-8;

/// Name of the mean per-period return metric.
pub const MEAN_RETURN: &str = "MeanReturn";
/// Name of the first-to-last return metric.
pub const TOTAL_RETURN: &str = "TotalReturn";
/// Name of the maximum drawdown metric.
pub const MAX_DRAWDOWN: &str = "MaxDrawdown";
/// Name of the annualized volatility metric.
pub const ANNUALIZED_VOLATILITY: &str = "AnnualizedVolatility";
/// Name of the annualized Sharpe ratio metric.
pub const SHARPE: &str = "Sharpe";
/// Name of the annualized Sortino ratio metric.
pub const SORTINO: &str = "Sortino";

/// Read-only view of a collector's series, handed to every metric function.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    /// Recorded values, in order.
    pub values: &'a [f64],
    /// `returns[i]` is the relative change from `values[i]` to `values[i + 1]`.
    pub returns: &'a [f64],
}

/// A named statistic computed from a finished series.
pub type MetricFn = Box<dyn Fn(&Series<'_>) -> f64 + Send + Sync>;

/// Metric name to value.
pub type StatsMap = BTreeMap<String, f64>;

/// Accumulates a value series and evaluates registered metrics over it.
#[derive(Default)]
pub struct StatsCollector {
    values: Vec<f64>,
    returns: Vec<f64>,
    metrics: BTreeMap<String, MetricFn>,
}

impl fmt::Debug for StatsCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsCollector")
            .field("values", &self.values.len())
            .field("returns", &self.returns.len())
            .field("metrics", &self.metrics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StatsCollector {
    /// Creates an empty collector with no metric registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value`, and the return from the previous value when there is one.
    pub fn record(&mut self, value: f64) {
        if let Some(&prev) = self.values.last() {
            self.returns.push((value - prev) / (prev.abs() + RETURN_EPSILON));
        }
        self.values.push(value);
    }

    /// Registers `metric` under `name`.
    ///
    /// ### Returns
    /// `false`, leaving the existing metric in place, if `name` is already registered.
    pub fn register_metric<F>(&mut self, name: impl Into<String>, metric: F) -> bool
    where
        F: Fn(&Series<'_>) -> f64 + Send + Sync + 'static,
    {
        let name = name.into();
        if self.metrics.contains_key(&name) {
            return false;
        }
        self.metrics.insert(name, Box::new(metric));
        true
    }

    /// Returns `true` if a metric is registered under `name`.
    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    /// Returns the registered metric names, sorted.
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Recorded values, in order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns derived so far, one fewer than the values.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// First recorded value.
    pub fn initial_value(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Snapshot handed to metric functions.
    pub fn series(&self) -> Series<'_> {
        Series {
            values: &self.values,
            returns: &self.returns,
        }
    }

    /// Evaluates every registered metric once.
    ///
    /// ### Returns
    /// An empty map when fewer than two values were recorded, otherwise one entry per metric.
    pub fn compute_all(&self) -> StatsMap {
        if self.values.len() < 2 {
            return StatsMap::new();
        }
        let series = self.series();
        self.metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric(&series)))
            .collect()
    }
}

/// Arithmetic mean of the returns, 0 when there are none.
pub fn mean_return(series: &Series<'_>) -> f64 {
    mean(series.returns)
}

/// `last / first - 1`, 0 when the first value is (almost) zero.
pub fn total_return(series: &Series<'_>) -> f64 {
    match (series.values.first(), series.values.last()) {
        (Some(&first), Some(&last)) if first.abs() > RETURN_EPSILON => last / first - 1.0,
        _ => 0.0,
    }
}

/// Worst relative decline from a running peak, as a non-positive fraction.
///
/// Peaks at or below zero are skipped since a relative drawdown is meaningless there.
pub fn max_drawdown(series: &Series<'_>) -> f64 {
    let Some(&first) = series.values.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_drawdown: f64 = 0.0;
    for &value in series.values {
        peak = peak.max(value);
        if peak > RETURN_EPSILON {
            max_drawdown = max_drawdown.min((value - peak) / peak);
        }
    }
    max_drawdown
}

/// Population standard deviation of returns scaled by `sqrt(periods_per_year)`.
pub fn annualized_volatility(series: &Series<'_>, periods_per_year: f64) -> f64 {
    if series.returns.len() < 2 {
        return 0.0;
    }
    population_variance(series.returns).sqrt() * periods_per_year.sqrt()
}

/// Annualized Sharpe ratio. `risk_free_rate` is expressed per period.
pub fn sharpe_ratio(series: &Series<'_>, risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if series.returns.len() < 2 {
        return 0.0;
    }
    let variance = population_variance(series.returns);
    (mean(series.returns) - risk_free_rate) / (variance + RETURN_EPSILON).sqrt() * periods_per_year.sqrt()
}

/// Annualized Sortino ratio, penalizing only negative returns.
///
/// 0 with fewer than two returns or when no return is negative.
pub fn sortino_ratio(series: &Series<'_>, risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let downside = series.returns.iter().filter(|r| **r < 0.0).map(|r| r * r).collect::<Vec<_>>();
    if series.returns.len() < 2 || downside.is_empty() {
        return 0.0;
    }
    let downside_variance = mean(&downside);
    (mean(series.returns) - risk_free_rate) / (downside_variance + RETURN_EPSILON).sqrt() * periods_per_year.sqrt()
}

/// Registers the standard metric set, annualized for `time_frame`.
pub fn register_standard_metrics(collector: &mut StatsCollector, time_frame: TimeFrame, risk_free_rate: f64) {
    let periods = time_frame.periods_per_year();

    collector.register_metric(MEAN_RETURN, mean_return);
    collector.register_metric(TOTAL_RETURN, total_return);
    collector.register_metric(MAX_DRAWDOWN, max_drawdown);
    collector.register_metric(ANNUALIZED_VOLATILITY, move |s: &Series<'_>| annualized_volatility(s, periods));
    collector.register_metric(SHARPE, move |s: &Series<'_>| sharpe_ratio(s, risk_free_rate, periods));
    collector.register_metric(SORTINO, move |s: &Series<'_>| sortino_ratio(s, risk_free_rate, periods));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector_with(values: &[f64]) -> StatsCollector {
        let mut collector = StatsCollector::new();
        for &value in values {
            collector.record(value);
        }
        collector
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn record_derives_returns() {
        let collector = collector_with(&[100.0, 110.0, 99.0]);
        assert_eq!(collector.values(), &[100.0, 110.0, 99.0]);
        assert_eq!(collector.returns().len(), 2);
        assert!(close(collector.returns()[0], 0.1));
        assert!(close(collector.returns()[1], -0.1));
        assert_eq!(collector.initial_value(), Some(100.0));
    }

    #[test]
    fn first_value_has_no_return() {
        let collector = collector_with(&[100.0]);
        assert!(collector.returns().is_empty());
        assert!(StatsCollector::new().initial_value().is_none());
    }

    #[test]
    fn return_from_zero_is_finite() {
        let collector = collector_with(&[0.0, 1.0]);
        assert!(collector.returns()[0].is_finite());
        assert!(close(collector.returns()[0], 1.0 / RETURN_EPSILON));
    }

    #[test]
    fn first_registration_wins() {
        let mut collector = collector_with(&[1.0, 2.0]);
        assert!(collector.register_metric("X", |_: &Series<'_>| 1.0));
        assert!(!collector.register_metric("X", |_: &Series<'_>| 2.0));
        assert_eq!(collector.metric_names().collect::<Vec<_>>(), vec!["X"]);
        assert_eq!(collector.compute_all()["X"], 1.0);
    }

    #[test]
    fn compute_all_needs_two_values() {
        let mut collector = StatsCollector::new();
        register_standard_metrics(&mut collector, TimeFrame::Minute, 0.0);
        assert!(collector.compute_all().is_empty());

        collector.record(100.0);
        assert!(collector.compute_all().is_empty());

        collector.record(101.0);
        assert_eq!(collector.compute_all().len(), 6);
    }

    #[test]
    fn metrics_see_final_series() {
        let mut collector = StatsCollector::new();
        collector.register_metric("Count", |s: &Series<'_>| s.values.len() as f64);
        for value in [1.0, 2.0, 3.0, 4.0] {
            collector.record(value);
        }
        assert_eq!(collector.compute_all()["Count"], 4.0);
    }

    #[test]
    fn mean_and_total_return() {
        let collector = collector_with(&[100.0, 110.0, 121.0]);
        let series = collector.series();
        assert!(close(mean_return(&series), 0.1));
        assert!(close(total_return(&series), 0.21));
    }

    #[test]
    fn total_return_from_zero() {
        let collector = collector_with(&[0.0, 10.0]);
        assert_eq!(total_return(&collector.series()), 0.0);
    }

    #[test]
    fn max_drawdown_tracks_running_peak() {
        let collector = collector_with(&[10_000.0, 12_000.0, 9_000.0, 11_000.0]);
        assert!(close(max_drawdown(&collector.series()), -0.25));
    }

    #[test]
    fn max_drawdown_monotonic_rise() {
        let collector = collector_with(&[1.0, 2.0, 3.0]);
        assert_eq!(max_drawdown(&collector.series()), 0.0);
    }

    #[test]
    fn max_drawdown_skips_non_positive_peaks() {
        let collector = collector_with(&[-5.0, -10.0, -2.0, -8.0]);
        assert_eq!(max_drawdown(&collector.series()), 0.0);
    }

    #[test]
    fn volatility_annualized() {
        // returns: +0.1, -0.1 → population std 0.1
        let collector = collector_with(&[100.0, 110.0, 99.0]);
        let vol = annualized_volatility(&collector.series(), 252.0);
        assert!((vol - 0.1 * 252.0_f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn volatility_requires_two_returns() {
        let collector = collector_with(&[100.0, 110.0]);
        assert_eq!(annualized_volatility(&collector.series(), 252.0), 0.0);
        assert_eq!(sharpe_ratio(&collector.series(), 0.0, 252.0), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_mean() {
        let up = collector_with(&[100.0, 101.0, 103.0, 104.0]);
        assert!(sharpe_ratio(&up.series(), 0.0, 252.0) > 0.0);

        let down = collector_with(&[104.0, 103.0, 101.0, 100.0]);
        assert!(sharpe_ratio(&down.series(), 0.0, 252.0) < 0.0);
    }

    #[test]
    fn sortino_uses_downside_only() {
        let collector = collector_with(&[100.0, 110.0, 99.0, 108.9]);
        let series = collector.series();
        let m = mean(series.returns);
        let downside = series.returns.iter().filter(|r| **r < 0.0).map(|r| r * r).sum::<f64>();
        let expected = m / (downside + RETURN_EPSILON).sqrt() * 252.0_f64.sqrt();
        assert!(close(sortino_ratio(&series, 0.0, 252.0), expected));
    }

    #[test]
    fn sortino_without_losses() {
        let collector = collector_with(&[100.0, 101.0, 102.0]);
        assert_eq!(sortino_ratio(&collector.series(), 0.0, 252.0), 0.0);
    }

    #[test]
    fn standard_metrics_registered_once() {
        let mut collector = StatsCollector::new();
        collector.register_metric(SHARPE, |_: &Series<'_>| 42.0);
        register_standard_metrics(&mut collector, TimeFrame::Day, 0.0);
        for name in [MEAN_RETURN, TOTAL_RETURN, MAX_DRAWDOWN, ANNUALIZED_VOLATILITY, SHARPE, SORTINO] {
            assert!(collector.has_metric(name));
        }
        collector.record(1.0);
        collector.record(2.0);
        assert_eq!(collector.compute_all()[SHARPE], 42.0);
    }
}
