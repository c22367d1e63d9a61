use std::slice::Iter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{MarketEvent, Order, OrderSide, QuoteTick, Tick};

/// Cash, position and pending limit orders of a single strategy.
///
/// ### Caller contract
/// The ledger does **not** check funds or exposure. A buy can drive cash below zero and a sell can
/// drive the position arbitrarily short. Bounding leverage is the strategy's responsibility.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Ledger {
    // Cash the ledger was opened with
    initial_cash: f64,
    cash: f64,
    // Positive = long, negative = short
    position: f64,
    // Limit orders waiting for a qualifying event, in submission order
    pending: Vec<Order>,
    // Number of executed orders
    fills: usize,
}

impl Ledger {
    /// Opens a flat ledger holding `initial_cash`.
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            position: 0.0,
            pending: Vec::new(),
            fills: 0,
        }
    }

    /// Cash the ledger was opened with.
    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Current cash, possibly negative.
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Net position: positive when long, negative when short.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Number of orders executed so far.
    pub fn fills(&self) -> usize {
        self.fills
    }

    /// Returns an iterator over the pending limit orders, oldest first.
    pub fn pending_orders(&self) -> Iter<'_, Order> {
        self.pending.iter()
    }

    /// Submits an order.
    ///
    /// Market orders execute immediately at their own price. Limit orders wait until
    /// [`match_trade`](Self::match_trade) or [`match_quote`](Self::match_quote) fills them.
    pub fn submit(&mut self, order: Order) {
        if order.is_market_type() {
            self.execute(&order);
        } else {
            self.pending.push(order);
        }
    }

    /// Fills every pending limit order the trade crosses.
    ///
    /// A buy fills when `price <= limit`, a sell when `price >= limit`.
    pub fn match_trade(&mut self, tick: &Tick) {
        let price = tick.price();
        self.match_pending(|order| match order.side {
            OrderSide::Buy => price <= order.price(),
            OrderSide::Sell => price >= order.price(),
        });
    }

    /// Fills every pending limit order the quote crosses.
    ///
    /// A buy fills when the limit reaches the ask, a sell when the limit reaches down to the bid.
    pub fn match_quote(&mut self, quote: &QuoteTick) {
        let (bid, ask) = (quote.bid(), quote.ask());
        self.match_pending(|order| match order.side {
            OrderSide::Buy => order.price() >= ask,
            OrderSide::Sell => order.price() <= bid,
        });
    }

    /// Dispatches to [`match_trade`](Self::match_trade) or [`match_quote`](Self::match_quote).
    pub fn match_event(&mut self, event: &MarketEvent) {
        match event {
            MarketEvent::Trade(tick) => self.match_trade(tick),
            MarketEvent::Quote(quote) => self.match_quote(quote),
        }
    }

    // Single pass; orders that do not fill keep their relative order.
    fn match_pending<F>(&mut self, mut crosses: F)
    where
        F: FnMut(&Order) -> bool,
    {
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for order in std::mem::take(&mut self.pending) {
            if crosses(&order) {
                self.execute(&order);
            } else {
                still_pending.push(order);
            }
        }
        self.pending = still_pending;
    }

    /// Applies the fill of `order` at its own price.
    pub fn execute(&mut self, order: &Order) {
        match order.side {
            OrderSide::Buy => {
                self.position += order.volume;
                self.cash -= order.cost();
            }
            OrderSide::Sell => {
                self.position -= order.volume;
                self.cash += order.cost();
            }
        }
        self.fills += 1;
    }

    /// Cash plus the position marked at `price`.
    pub fn valuation(&self, price: f64) -> f64 {
        self.cash + self.position * price
    }
}

#[cfg(test)]
#[test]
fn new_ledger_is_flat() {
    let ledger = Ledger::new(10_000.0);
    assert_eq!(ledger.cash(), 10_000.0);
    assert_eq!(ledger.initial_cash(), 10_000.0);
    assert_eq!(ledger.position(), 0.0);
    assert_eq!(ledger.fills(), 0);
    assert_eq!(ledger.pending_orders().count(), 0);
    assert_eq!(ledger.valuation(123.0), 10_000.0);
}

#[cfg(test)]
#[test]
fn market_round_trip() {
    let mut ledger = Ledger::new(10_000.0);
    ledger.submit(Order::market(OrderSide::Buy, 0, 1.0, 100.0));
    assert_eq!(ledger.cash(), 9_900.0);
    assert_eq!(ledger.position(), 1.0);

    ledger.submit(Order::market(OrderSide::Sell, 1, 1.0, 110.0));
    assert_eq!(ledger.position(), 0.0);
    assert_eq!(ledger.fills(), 2);
    assert_eq!(ledger.valuation(0.0), 10_010.0);
    assert_eq!(ledger.valuation(1_000.0), 10_010.0);
}

#[cfg(test)]
#[test]
fn unconstrained_leverage() {
    let mut ledger = Ledger::new(100.0);
    ledger.submit(Order::market(OrderSide::Buy, 0, 10.0, 50.0));
    assert_eq!(ledger.cash(), -400.0);

    ledger.submit(Order::market(OrderSide::Sell, 0, 25.0, 50.0));
    assert_eq!(ledger.position(), -15.0);
    assert_eq!(ledger.cash(), 850.0);
}

#[cfg(test)]
#[test]
fn limit_orders_wait_for_trades() {
    let mut ledger = Ledger::new(1_000.0);
    ledger.submit(Order::limit(OrderSide::Buy, 0, 1.0, 95.0));
    ledger.submit(Order::limit(OrderSide::Sell, 0, 1.0, 105.0));
    assert_eq!(ledger.pending_orders().count(), 2);
    assert_eq!(ledger.cash(), 1_000.0);

    ledger.match_trade(&Tick::from((1, 100.0, 1.0)));
    assert_eq!(ledger.pending_orders().count(), 2);

    ledger.match_trade(&Tick::from((2, 95.0, 1.0)));
    assert_eq!(ledger.position(), 1.0);
    assert_eq!(ledger.cash(), 905.0);
    let remaining = ledger.pending_orders().collect::<Vec<_>>();
    assert_eq!(remaining.len(), 1);
    assert!(matches!(remaining[0].side, OrderSide::Sell));

    ledger.match_trade(&Tick::from((3, 106.0, 1.0)));
    assert_eq!(ledger.position(), 0.0);
    assert_eq!(ledger.cash(), 1_010.0);
    assert_eq!(ledger.pending_orders().count(), 0);
}

#[cfg(test)]
#[test]
fn buy_limit_fills_on_quote_at_or_below_limit() {
    let mut ledger = Ledger::new(10_000.0);
    ledger.submit(Order::limit(OrderSide::Buy, 0, 1.0, 101.0));

    ledger.match_quote(&QuoteTick::from((1, 101.0, 101.5, 1.0)));
    assert_eq!(ledger.position(), 0.0);
    assert_eq!(ledger.pending_orders().count(), 1);

    ledger.match_quote(&QuoteTick::from((2, 100.5, 101.0, 1.0)));
    assert_eq!(ledger.position(), 1.0);
    assert_eq!(ledger.cash(), 9_899.0);
    assert_eq!(ledger.pending_orders().count(), 0);
}

#[cfg(test)]
#[test]
fn sell_limit_fills_on_quote_bid() {
    let mut ledger = Ledger::new(0.0);
    ledger.submit(Order::limit(OrderSide::Sell, 0, 2.0, 100.0));

    ledger.match_event(&QuoteTick::from((1, 99.9, 100.1, 1.0)).into());
    assert_eq!(ledger.pending_orders().count(), 1);

    ledger.match_event(&QuoteTick::from((2, 100.0, 100.2, 1.0)).into());
    assert_eq!(ledger.position(), -2.0);
    assert_eq!(ledger.cash(), 200.0);
}

#[cfg(test)]
#[test]
fn pending_order_keeps_submission_order() {
    let mut ledger = Ledger::new(0.0);
    for (i, price) in [90.0, 80.0, 95.0, 70.0].into_iter().enumerate() {
        ledger.submit(Order::limit(OrderSide::Buy, i as u64, 1.0, price));
    }
    ledger.match_trade(&Tick::from((10, 85.0, 1.0)));

    let prices = ledger.pending_orders().map(Order::price).collect::<Vec<_>>();
    assert_eq!(prices, vec![80.0, 70.0]);
    assert_eq!(ledger.fills(), 2);
}
