#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents the side of an order (buy or sell).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    /// Increases the position.
    Buy,
    /// Decreases the position.
    Sell,
}

impl OrderSide {
    /// Sign applied to the volume when the order changes the position.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }
}

/// Represents the type of an order.
///
/// A market order carries the price it executes at; a limit order carries its trigger price.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderType {
    /// Executes immediately at the carried price.
    Market(f64),
    /// Rests until the market crosses the carried price.
    Limit(f64),
}

impl OrderType {
    /// Returns the price associated with the order type.
    pub fn inner(&self) -> f64 {
        match self {
            Self::Market(price) | Self::Limit(price) => *price,
        }
    }
}

/// An instruction to trade `volume` units on one side.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    order_type: OrderType,
    timestamp: u64,
    /// Quantity to trade, always positive.
    pub volume: f64,
    /// Direction of the trade.
    pub side: OrderSide,
}

type O1 = (OrderType, f64, OrderSide);
type O2 = (OrderType, f64, OrderSide, u64);
impl From<O1> for Order {
    fn from((order_type, volume, side): O1) -> Self {
        Self {
            order_type,
            timestamp: 0,
            volume,
            side,
        }
    }
}

impl From<O2> for Order {
    fn from((order_type, volume, side, timestamp): O2) -> Self {
        Self {
            order_type,
            timestamp,
            volume,
            side,
        }
    }
}

impl Order {
    /// Market order executing at `price`.
    pub fn market(side: OrderSide, timestamp: u64, volume: f64, price: f64) -> Self {
        (OrderType::Market(price), volume, side, timestamp).into()
    }

    /// Limit order triggering at `price`.
    pub fn limit(side: OrderSide, timestamp: u64, volume: f64, price: f64) -> Self {
        (OrderType::Limit(price), volume, side, timestamp).into()
    }

    /// Returns the execution price (market) or trigger price (limit).
    pub fn price(&self) -> f64 {
        self.order_type.inner()
    }

    /// Market or limit, with its price.
    pub fn order_type(&self) -> &OrderType {
        &self.order_type
    }

    /// Time the order was created, in milliseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// `true` for market orders.
    pub fn is_market_type(&self) -> bool {
        matches!(self.order_type, OrderType::Market(_))
    }

    /// Position change once filled: positive for buys, negative for sells.
    pub fn signed_volume(&self) -> f64 {
        self.side.sign() * self.volume
    }

    /// Returns the total notional of the order (price * volume).
    pub fn cost(&self) -> f64 {
        self.price() * self.volume
    }
}

#[cfg(test)]
#[test]
fn create_market_order() {
    let order: Order = (OrderType::Market(100.0), 2.0, OrderSide::Buy).into();

    assert_eq!(order.price(), 100.0);
    assert_eq!(order.volume, 2.0);
    assert_eq!(order.cost(), 200.0);
    assert_eq!(order.timestamp(), 0);
    assert!(order.is_market_type());
    assert!(matches!(order.side, OrderSide::Buy));
}

#[cfg(test)]
#[test]
fn create_limit_order() {
    let order = Order::limit(OrderSide::Sell, 1_000, 1.5, 120.0);

    assert_eq!(order.price(), 120.0);
    assert_eq!(order.timestamp(), 1_000);
    assert_eq!(order.cost(), 180.0);
    assert!(!order.is_market_type());
    assert!(matches!(order.order_type(), OrderType::Limit(120.0)));
}

#[cfg(test)]
#[test]
fn signed_volume() {
    let buy = Order::market(OrderSide::Buy, 0, 3.0, 10.0);
    let sell = Order::market(OrderSide::Sell, 0, 3.0, 10.0);
    assert_eq!(buy.signed_volume(), 3.0);
    assert_eq!(sell.signed_volume(), -3.0);
}

#[cfg(test)]
#[test]
fn order_type_inner() {
    assert_eq!(OrderType::Market(100.0).inner(), 100.0);
    assert_eq!(OrderType::Limit(150.0).inner(), 150.0);
}
