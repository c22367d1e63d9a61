use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trading days in a year, used to annualize per-period statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Sampling period of a series.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    /// One minute.
    #[default]
    Minute,
    /// Five minutes.
    FiveMinutes,
    /// One hour.
    Hour,
    /// One trading day.
    Day,
}

impl TimeFrame {
    /// Periods in one 6.5 hour trading session.
    pub fn ticks_per_day(&self) -> f64 {
        match self {
            Self::Minute => 390.0,
            Self::FiveMinutes => 78.0,
            Self::Hour => 6.5,
            Self::Day => 1.0,
        }
    }

    /// Periods in a trading year.
    pub fn periods_per_year(&self) -> f64 {
        self.ticks_per_day() * TRADING_DAYS_PER_YEAR
    }

    /// Length of one period in milliseconds.
    pub fn millis(&self) -> u64 {
        match self {
            Self::Minute => 60_000,
            Self::FiveMinutes => 300_000,
            Self::Hour => 3_600_000,
            Self::Day => 86_400_000,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minute => write!(f, "1m"),
            Self::FiveMinutes => write!(f, "5m"),
            Self::Hour => write!(f, "1h"),
            Self::Day => write!(f, "1d"),
        }
    }
}

#[cfg(test)]
#[test]
fn periods_per_year() {
    assert_eq!(TimeFrame::Minute.periods_per_year(), 98_280.0);
    assert_eq!(TimeFrame::FiveMinutes.periods_per_year(), 19_656.0);
    assert_eq!(TimeFrame::Hour.periods_per_year(), 1_638.0);
    assert_eq!(TimeFrame::Day.periods_per_year(), 252.0);
}
