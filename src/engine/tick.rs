use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of market data a strategy consumes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Executed trades ([`Tick`]).
    Trade,
    /// Best bid/ask snapshots ([`QuoteTick`]).
    Quote,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trade => write!(f, "trade"),
            Self::Quote => write!(f, "quote"),
        }
    }
}

/// A single executed trade.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    timestamp: u64,
    price: f64,
    volume: f64,
}

impl From<(u64, f64, f64)> for Tick {
    fn from((timestamp, price, volume): (u64, f64, f64)) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }
}

impl Tick {
    /// Milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Execution price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Traded quantity.
    pub fn volume(&self) -> f64 {
        self.volume
    }
}

/// A best bid/ask snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteTick {
    timestamp: u64,
    bid: f64,
    ask: f64,
    volume: f64,
}

impl From<(u64, f64, f64, f64)> for QuoteTick {
    fn from((timestamp, bid, ask, volume): (u64, f64, f64, f64)) -> Self {
        Self {
            timestamp,
            bid,
            ask,
            volume,
        }
    }
}

impl QuoteTick {
    /// Milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Best bid.
    pub fn bid(&self) -> f64 {
        self.bid
    }

    /// Best ask.
    pub fn ask(&self) -> f64 {
        self.ask
    }

    /// Quoted quantity.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Midpoint between bid and ask, used to mark positions.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// `ask - bid`.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// Either shape of market data, as delivered to a ledger.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarketEvent {
    /// An executed trade.
    Trade(Tick),
    /// A bid/ask snapshot.
    Quote(QuoteTick),
}

impl From<Tick> for MarketEvent {
    fn from(value: Tick) -> Self {
        Self::Trade(value)
    }
}

impl From<QuoteTick> for MarketEvent {
    fn from(value: QuoteTick) -> Self {
        Self::Quote(value)
    }
}

impl MarketEvent {
    /// Kind of the wrapped event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Trade(_) => EventKind::Trade,
            Self::Quote(_) => EventKind::Quote,
        }
    }

    /// Timestamp of the wrapped event, in milliseconds.
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Trade(tick) => tick.timestamp(),
            Self::Quote(quote) => quote.timestamp(),
        }
    }

    /// Price used to value a position at this event: trade price, or quote midpoint.
    pub fn reference_price(&self) -> f64 {
        match self {
            Self::Trade(tick) => tick.price(),
            Self::Quote(quote) => quote.mid(),
        }
    }
}

#[cfg(test)]
#[test]
fn quote_mid_and_spread() {
    let quote = QuoteTick::from((0, 99.5, 100.5, 1.0));
    assert_eq!(quote.mid(), 100.0);
    assert_eq!(quote.spread(), 1.0);
}

#[cfg(test)]
#[test]
fn market_event_reference_price() {
    let trade: MarketEvent = Tick::from((10, 101.0, 2.0)).into();
    assert_eq!(trade.kind(), EventKind::Trade);
    assert_eq!(trade.timestamp(), 10);
    assert_eq!(trade.reference_price(), 101.0);

    let quote: MarketEvent = QuoteTick::from((20, 99.0, 101.0, 1.0)).into();
    assert_eq!(quote.kind(), EventKind::Quote);
    assert_eq!(quote.timestamp(), 20);
    assert_eq!(quote.reference_price(), 100.0);
}
