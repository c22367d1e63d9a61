use std::path::PathBuf;

use crate::engine::TimeFrame;
use crate::errors::{Error, Result};

/// Smallest accepted number of generated ticks.
pub const MIN_TICKS: usize = 10;
/// Largest accepted number of generated ticks.
pub const MAX_TICKS: usize = 100_000;
/// Largest accepted initial capital.
pub const MAX_CAPITAL: f64 = 100_000_000.0;

/// Parameters of a simulation run, as supplied by the command line or the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of ticks (and quotes) to generate.
    pub num_ticks: usize,
    /// Cash every strategy starts with.
    pub initial_capital: f64,
    /// Sampling period of the generated data and of the metrics.
    pub time_frame: TimeFrame,
    /// Seed for reproducible data; entropy when `None`.
    pub seed: Option<u64>,
    /// Directory receiving CSV exports; none when `None`.
    pub output_dir: Option<PathBuf>,
    /// Suppresses console reports.
    pub quiet: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_ticks: 1_000,
            initial_capital: 10_000.0,
            time_frame: TimeFrame::Minute,
            seed: None,
            output_dir: None,
            quiet: false,
        }
    }
}

impl SimulationConfig {
    /// Checks the tick count and capital ranges.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TICKS..=MAX_TICKS).contains(&self.num_ticks) {
            return Err(Error::TickCountOutOfRange(self.num_ticks));
        }
        if !(self.initial_capital > 0.0 && self.initial_capital <= MAX_CAPITAL) {
            return Err(Error::CapitalOutOfRange(self.initial_capital));
        }
        Ok(())
    }
}

#[cfg(test)]
#[test]
fn default_is_valid() {
    assert!(SimulationConfig::default().validate().is_ok());
}

#[cfg(test)]
#[test]
fn rejects_out_of_range_ticks() {
    for num_ticks in [0, 9, 100_001] {
        let config = SimulationConfig {
            num_ticks,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::TickCountOutOfRange(n)) if n == num_ticks));
    }
}

#[cfg(test)]
#[test]
fn rejects_out_of_range_capital() {
    for initial_capital in [0.0, -1.0, 100_000_001.0, f64::NAN] {
        let config = SimulationConfig {
            initial_capital,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::CapitalOutOfRange(_))));
    }
}
