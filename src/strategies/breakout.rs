use std::collections::VecDeque;

use crate::engine::{Ledger, Order, OrderSide, Tick};
use crate::strategy::{Strategy, TradeStrategy};

/// Channel breakout over the previous `window` trades.
///
/// While flat, buys one unit when the price breaks above the channel high. While long, sells when
/// it breaks below the channel low. No signal until the window is full.
#[derive(Debug, Clone)]
pub struct Breakout {
    window: usize,
    volume: f64,
    recent: VecDeque<f64>,
    in_position: bool,
}

impl Default for Breakout {
    fn default() -> Self {
        Self::new(20, 1.0)
    }
}

impl Breakout {
    /// Channel over the previous `window` trades, trading `volume` units.
    pub fn new(window: usize, volume: f64) -> Self {
        Self {
            window,
            volume,
            recent: VecDeque::with_capacity(window + 1),
            in_position: false,
        }
    }

    /// Number of trades in the channel.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Whether the strategy currently holds its entry.
    pub fn in_position(&self) -> bool {
        self.in_position
    }

    fn channel(&self) -> Option<(f64, f64)> {
        if self.window == 0 || self.recent.len() < self.window {
            return None;
        }
        let high = self.recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = self.recent.iter().copied().fold(f64::INFINITY, f64::min);
        Some((high, low))
    }
}

impl Strategy for Breakout {}

impl TradeStrategy for Breakout {
    fn on_tick(&mut self, tick: &Tick, ledger: &mut Ledger) {
        let price = tick.price();

        if let Some((high, low)) = self.channel() {
            if !self.in_position && price > high {
                ledger.submit(Order::market(OrderSide::Buy, tick.timestamp(), self.volume, price));
                self.in_position = true;
                tracing::debug!(price, high, "breakout buy");
            } else if self.in_position && price < low {
                ledger.submit(Order::market(OrderSide::Sell, tick.timestamp(), self.volume, price));
                self.in_position = false;
                tracing::debug!(price, low, "breakout sell");
            }
        }

        self.recent.push_back(price);
        if self.recent.len() > self.window {
            self.recent.pop_front();
        }
    }
}

#[cfg(test)]
#[test]
fn waits_for_full_window() {
    let mut strategy = Breakout::new(3, 1.0);
    let mut ledger = Ledger::new(1_000.0);
    for (ts, price) in [(0, 10.0), (1, 11.0), (2, 12.0)] {
        strategy.on_tick(&Tick::from((ts, price, 1.0)), &mut ledger);
    }
    assert_eq!(ledger.fills(), 0);

    strategy.on_tick(&Tick::from((3, 13.0, 1.0)), &mut ledger);
    assert!(strategy.in_position());
    assert_eq!(ledger.cash(), 987.0);
}

#[cfg(test)]
#[test]
fn exits_below_channel_low() {
    let mut strategy = Breakout::new(3, 1.0);
    let mut ledger = Ledger::new(1_000.0);
    // channel before the last tick: [13, 12, 12.5] → low 12
    for (ts, price) in [(0, 10.0), (1, 11.0), (2, 12.0), (3, 13.0), (4, 12.0), (5, 12.5), (6, 11.5)] {
        strategy.on_tick(&Tick::from((ts, price, 1.0)), &mut ledger);
    }
    assert!(!strategy.in_position());
    assert_eq!(ledger.position(), 0.0);
    assert_eq!(ledger.cash(), 998.5);
}
