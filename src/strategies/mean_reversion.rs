use crate::PercentCalculus;
use crate::engine::{Ledger, Order, OrderSide, Tick};
use crate::strategy::{Strategy, TradeStrategy};

/// Buys one unit after a drop of more than `threshold` percent from the previous trade, and sells
/// it once the price exceeds the entry by more than `threshold` percent.
#[derive(Debug, Clone)]
pub struct MeanReversion {
    threshold: f64,
    volume: f64,
    last_price: Option<f64>,
    entry_price: Option<f64>,
}

impl Default for MeanReversion {
    fn default() -> Self {
        Self::new(0.5, 1.0)
    }
}

impl MeanReversion {
    /// `threshold` is a percentage (0.5 for 0.5%).
    pub fn new(threshold: f64, volume: f64) -> Self {
        Self {
            threshold,
            volume,
            last_price: None,
            entry_price: None,
        }
    }

    /// Whether the strategy currently holds its entry.
    pub fn in_position(&self) -> bool {
        self.entry_price.is_some()
    }
}

impl Strategy for MeanReversion {}

impl TradeStrategy for MeanReversion {
    fn on_tick(&mut self, tick: &Tick, ledger: &mut Ledger) {
        let price = tick.price();
        let Some(last_price) = self.last_price.replace(price) else {
            return;
        };

        match self.entry_price {
            None if price < last_price.subpercent(self.threshold) => {
                ledger.submit(Order::market(OrderSide::Buy, tick.timestamp(), self.volume, price));
                self.entry_price = Some(price);
                tracing::debug!(price, "mean reversion buy");
            }
            Some(entry) if price > entry.addpercent(self.threshold) => {
                ledger.submit(Order::market(OrderSide::Sell, tick.timestamp(), self.volume, price));
                self.entry_price = None;
                tracing::debug!(price, entry, "mean reversion sell");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[test]
fn buys_dip_and_sells_rebound() {
    let mut strategy = MeanReversion::default();
    let mut ledger = Ledger::new(1_000.0);

    for (ts, price) in [(0, 100.0), (1, 99.0), (2, 99.2), (3, 99.4)] {
        strategy.on_tick(&Tick::from((ts, price, 1.0)), &mut ledger);
    }
    assert!(strategy.in_position());
    assert_eq!(ledger.position(), 1.0);
    assert_eq!(ledger.cash(), 901.0);

    strategy.on_tick(&Tick::from((4, 99.45, 1.0)), &mut ledger);
    assert!(strategy.in_position());

    strategy.on_tick(&Tick::from((5, 100.0, 1.0)), &mut ledger);
    assert!(!strategy.in_position());
    assert_eq!(ledger.position(), 0.0);
    assert_eq!(ledger.cash(), 1_001.0);
}

#[cfg(test)]
#[test]
fn first_tick_only_primes() {
    let mut strategy = MeanReversion::default();
    let mut ledger = Ledger::new(1_000.0);
    strategy.on_tick(&Tick::from((0, 1.0, 1.0)), &mut ledger);
    assert_eq!(ledger.fills(), 0);
    assert!(!strategy.in_position());
}
