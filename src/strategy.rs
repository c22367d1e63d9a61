//! Strategy contract.
//!
//! A strategy consumes one kind of market data and trades through the [`Ledger`] it is bound to.
//! The engine owns that binding: every hook receives the strategy's own ledger, which nothing else
//! touches for the duration of the run.
//!
//! The kind of data is fixed when the strategy is wrapped into a [`StrategyKind`], so the engine
//! picks the event series once per run instead of testing every event.

use crate::engine::{Bar, BarAggregator, EventKind, Ledger, QuoteTick, Tick};
use crate::errors::Result;

/// Lifecycle hooks shared by every strategy.
pub trait Strategy: Send {
    /// Called once before the first event.
    fn on_start(&mut self, _ledger: &mut Ledger) {}

    /// Called once after the last event.
    fn on_end(&mut self, _ledger: &mut Ledger) {}
}

/// A strategy driven by executed trades.
pub trait TradeStrategy: Strategy {
    /// Called for every trade, before the ledger matches its pending orders against it.
    fn on_tick(&mut self, tick: &Tick, ledger: &mut Ledger);
}

/// A strategy driven by bid/ask snapshots.
pub trait QuoteStrategy: Strategy {
    /// Called for every quote, before the ledger matches its pending orders against it.
    fn on_quote(&mut self, quote: &QuoteTick, ledger: &mut Ledger);
}

/// A strategy tagged with the kind of data it consumes.
pub enum StrategyKind {
    /// Consumes the trade series.
    Trade(Box<dyn TradeStrategy>),
    /// Consumes the quote series.
    Quote(Box<dyn QuoteStrategy>),
}

impl StrategyKind {
    /// Tags a trade-driven strategy.
    pub fn trade<S: TradeStrategy + 'static>(strategy: S) -> Self {
        Self::Trade(Box::new(strategy))
    }

    /// Tags a quote-driven strategy.
    pub fn quote<S: QuoteStrategy + 'static>(strategy: S) -> Self {
        Self::Quote(Box::new(strategy))
    }

    /// Kind of data the strategy consumes.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Trade(_) => EventKind::Trade,
            Self::Quote(_) => EventKind::Quote,
        }
    }

    pub(crate) fn on_start(&mut self, ledger: &mut Ledger) {
        match self {
            Self::Trade(strategy) => strategy.on_start(ledger),
            Self::Quote(strategy) => strategy.on_start(ledger),
        }
    }

    pub(crate) fn on_end(&mut self, ledger: &mut Ledger) {
        match self {
            Self::Trade(strategy) => strategy.on_end(ledger),
            Self::Quote(strategy) => strategy.on_end(ledger),
        }
    }
}

impl std::fmt::Debug for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StrategyKind::{:?}", self.kind())
    }
}

/// A strategy driven by completed bars.
pub trait BarStrategy: Strategy {
    /// Called with each sealed bar.
    fn on_bar(&mut self, bar: &Bar, ledger: &mut Ledger);
}

/// Runs a [`BarStrategy`] on trades by aggregating them into bars first.
///
/// The in-progress bar is never delivered: a bar reaches the strategy only once a later trade
/// closes its window.
#[derive(Debug, Clone)]
pub struct Bars<S> {
    aggregator: BarAggregator,
    inner: S,
}

impl<S: BarStrategy> Bars<S> {
    /// Wraps `inner` with windows of `window_size` milliseconds.
    pub fn new(inner: S, window_size: u64) -> Result<Self> {
        Ok(Self {
            aggregator: BarAggregator::new(window_size)?,
            inner,
        })
    }

    /// The wrapped bar strategy.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: BarStrategy> Strategy for Bars<S> {
    fn on_start(&mut self, ledger: &mut Ledger) {
        self.inner.on_start(ledger);
    }

    fn on_end(&mut self, ledger: &mut Ledger) {
        self.inner.on_end(ledger);
    }
}

impl<S: BarStrategy> TradeStrategy for Bars<S> {
    fn on_tick(&mut self, tick: &Tick, ledger: &mut Ledger) {
        if let Some(bar) = self.aggregator.update(tick) {
            self.inner.on_bar(&bar, ledger);
        }
    }
}
