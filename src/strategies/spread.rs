use crate::engine::{Ledger, Order, OrderSide, QuoteTick};
use crate::strategy::{QuoteStrategy, Strategy};

/// Position beyond which the strategy stops adding to the same side.
pub const MAX_INVENTORY: f64 = 5.0;

/// Rests limit orders `offset` outside the touch whenever the spread is at least `min_spread`.
///
/// Stops bidding once long [`MAX_INVENTORY`] units and stops offering once short as much.
#[derive(Debug, Clone)]
pub struct Spread {
    size: f64,
    min_spread: f64,
    offset: f64,
}

impl Default for Spread {
    fn default() -> Self {
        Self::new(1.0, 0.01, 0.005)
    }
}

impl Spread {
    /// Orders of `size` units, `offset` outside the touch, skipping spreads below `min_spread`.
    pub fn new(size: f64, min_spread: f64, offset: f64) -> Self {
        Self {
            size,
            min_spread,
            offset,
        }
    }
}

impl Strategy for Spread {}

impl QuoteStrategy for Spread {
    fn on_quote(&mut self, quote: &QuoteTick, ledger: &mut Ledger) {
        if quote.spread() < self.min_spread {
            return;
        }

        let position = ledger.position();
        if position < MAX_INVENTORY {
            let price = quote.bid() - self.offset;
            ledger.submit(Order::limit(OrderSide::Buy, quote.timestamp(), self.size, price));
            tracing::debug!(price, position, "spread bid");
        }
        if position > -MAX_INVENTORY {
            let price = quote.ask() + self.offset;
            ledger.submit(Order::limit(OrderSide::Sell, quote.timestamp(), self.size, price));
            tracing::debug!(price, position, "spread offer");
        }
    }
}

#[cfg(test)]
#[test]
fn quotes_both_sides() {
    let mut strategy = Spread::default();
    let mut ledger = Ledger::new(1_000.0);
    strategy.on_quote(&QuoteTick::from((0, 99.99, 100.01, 1.0)), &mut ledger);

    let prices = ledger.pending_orders().map(|o| (o.side, o.price())).collect::<Vec<_>>();
    assert_eq!(prices.len(), 2);
    assert!(matches!(prices[0].0, OrderSide::Buy));
    assert!((prices[0].1 - 99.985).abs() < 1e-9);
    assert!(matches!(prices[1].0, OrderSide::Sell));
    assert!((prices[1].1 - 100.015).abs() < 1e-9);
}

#[cfg(test)]
#[test]
fn ignores_tight_spread() {
    let mut strategy = Spread::default();
    let mut ledger = Ledger::new(1_000.0);
    strategy.on_quote(&QuoteTick::from((0, 100.0, 100.005, 1.0)), &mut ledger);
    assert_eq!(ledger.pending_orders().count(), 0);
}

#[cfg(test)]
#[test]
fn stops_bidding_at_max_inventory() {
    let mut strategy = Spread::default();
    let mut ledger = Ledger::new(1_000.0);
    ledger.submit(Order::market(OrderSide::Buy, 0, MAX_INVENTORY, 100.0));

    strategy.on_quote(&QuoteTick::from((1, 99.0, 101.0, 1.0)), &mut ledger);
    let sides = ledger.pending_orders().map(|o| o.side).collect::<Vec<_>>();
    assert_eq!(sides, vec![OrderSide::Sell]);
}
