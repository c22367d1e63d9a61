//! # BTE - Backtest Engine
//!
//! **A Rust library for running many trading strategies at once against synthetic market data.**
//!
//! BTE generates trade ticks and bid/ask quotes from a jump-diffusion price model, hands every
//! event to each registered strategy, simulates order execution against a per-strategy ledger and
//! reports performance statistics once the data is exhausted. Strategies run concurrently and share
//! nothing but the read-only event series.
//!
//! ## Key Features
//!
//! ### 1. **Market Data**
//! | Type           | Description                                                                  |
//! |----------------|------------------------------------------------------------------------------|
//! | **Tick**       | A trade: timestamp, price and volume.                                        |
//! | **QuoteTick**  | A top-of-book quote: timestamp, bid, ask and volume.                         |
//! | **Bar**        | OHLCV bar aggregated from ticks over a fixed time window.                    |
//!
//! ### 2. **Orders**
//! | Order Type | Description                                                                      |
//! |------------|----------------------------------------------------------------------------------|
//! | **Market** | Executes immediately at the price supplied with the order.                       |
//! | **Limit**  | Rests until a trade or quote crosses its price, then executes at the limit.      |
//!
//! ### 3. **Performance Metrics**
//! | Metric                    | Description                                                        |
//! |---------------------------|--------------------------------------------------------------------|
//! | **Mean Return**           | Average per-event return of the valuation series.                  |
//! | **Total Return**          | Last valuation over first, minus one.                              |
//! | **Max Drawdown**          | Worst decline from a running peak, as a non-positive fraction.     |
//! | **Annualized Volatility** | Standard deviation of returns scaled to one year.                  |
//! | **Sharpe Ratio**          | Annualized excess return per unit of volatility.                   |
//! | **Sortino Ratio**         | Like Sharpe, but only downside returns count as risk.              |
//!
//! Custom metrics can be registered per strategy before the run.
//!
//! ## Getting Started
//! ```rust
//! use bte_rs::prelude::*;
//!
//! let ticks = GbmJumpGenerator::new(500, TimeFrame::Minute, GbmParams::default(), Some(42))
//!     .generate_ticks()
//!     .unwrap();
//!
//! let mut engine = BacktestEngine::new();
//! engine.set_ticks(ticks);
//! engine.add_strategy(
//!     "Mean_Reversion",
//!     StrategyKind::trade(MeanReversion::default()),
//!     TimeFrame::Minute,
//!     10_000.0,
//! ).unwrap();
//!
//! for result in engine.run_all() {
//!     let report = result.unwrap();
//!     println!("{}: {:.2}", report.name, report.final_valuation);
//! }
//! ```
//!
//! ### Writing a strategy
//! ```rust
//! use bte_rs::prelude::*;
//!
//! struct BuyAndHold {
//!     bought: bool,
//! }
//!
//! impl Strategy for BuyAndHold {}
//!
//! impl TradeStrategy for BuyAndHold {
//!     fn on_tick(&mut self, tick: &Tick, ledger: &mut Ledger) {
//!         if !self.bought {
//!             ledger.submit(Order::market(OrderSide::Buy, tick.timestamp(), 1.0, tick.price()));
//!             self.bought = true;
//!         }
//!     }
//! }
//!
//! let mut engine = BacktestEngine::new();
//! engine.set_ticks(vec![Tick::from((0, 100.0, 1.0)), Tick::from((60_000, 101.0, 1.0))]);
//! engine.add_strategy("Hold", StrategyKind::trade(BuyAndHold { bought: false }), TimeFrame::Minute, 1_000.0).unwrap();
//!
//! let report = engine.run_all().remove(0).unwrap();
//! assert_eq!(report.final_valuation, 1_001.0);
//! ```
//!
//! ## Integrations
//! | Crate          | Purpose                                                                    |
//! |----------------|----------------------------------------------------------------------------|
//! | [`rayon`](https://crates.io/crates/rayon) | One task per strategy.                          |
//! | [`tracing`](https://crates.io/crates/tracing) | Structured run logs.                        |
//! | [`csv`](https://crates.io/crates/csv) | Valuation and statistics export.                    |
//! | [`serde`](https://crates.io/crates/serde) | Serialize run reports (feature `serde`).        |
//!
//! ## Error Handling
//! A strategy whose event series is empty fails on its own with [`errors::Error::NoEventData`];
//! the other strategies still complete. A run that completed is returned even when printing or
//! exporting its report fails; that failure is logged. Invalid simulation parameters, generator
//! parameters and strategy names are reported through the same [`errors::Error`] type.
//!
//! ## License
//! MIT
#![warn(missing_docs)]

/// Core engine components: market data, orders, ledger, bars and the concurrent runner.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Simulation parameters and their accepted ranges.
pub mod config;

/// Synthetic trade and quote generation.
pub mod generator;

/// Performance statistics: returns, drawdown, Sharpe ratio, etc.
pub mod metrics;

/// Console reports and CSV/JSON export.
pub mod report;

/// Strategy traits and the bar adapter.
pub mod strategy;

/// Ready-made strategies.
pub mod strategies;

/// Utility functions and helpers.
mod utils;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use super::*;
    pub use crate::config::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::generator::*;
    pub use crate::metrics::*;
    pub use crate::report::*;
    pub use crate::strategies::*;
    pub use crate::strategy::*;
}

use std::ops::{Add, Div, Mul, Sub};

/// Trait for performing percentage-based calculations.
pub trait PercentCalculus<Rhs = Self> {
    /// Adds a percentage to the value.
    ///
    /// ### Arguments
    /// * `rhs` - The percentage to add (e.g., 10.0 for 10%).
    fn addpercent(self, rhs: Rhs) -> Self;

    /// Subtracts a percentage from the value.
    ///
    /// ### Arguments
    /// * `rhs` - The percentage to subtract (e.g., 10.0 for 10%).
    fn subpercent(self, rhs: Rhs) -> Self;

    /// Calculates the percentage change between two values.
    ///
    /// ### Returns
    /// The percentage change from the original value to `new`, or 0 when the original value is 0.
    fn change(self, new: Self) -> Self;
}

impl PercentCalculus for f64 {
    fn addpercent(self, percent: Self) -> Self {
        self.add(self.mul(percent.div(100.0)))
    }

    fn subpercent(self, percent: Self) -> Self {
        self.sub(self.mul(percent.div(100.0)))
    }

    fn change(self, new: Self) -> Self {
        if self == 0.0 {
            return 0.0;
        }
        new.sub(self).div(self).mul(100.0)
    }
}
