use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Tick;
use crate::errors::{Error, Result};

/// OHLCV aggregate of the trades in `[start, end)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    start: u64,
    end: u64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Bar {
    // Opens a bar on `tick` for the window starting at `start`.
    fn seed(start: u64, window_size: u64, tick: &Tick) -> Self {
        let price = tick.price();
        Self {
            start,
            end: start.saturating_add(window_size),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: tick.volume(),
        }
    }

    fn push(&mut self, tick: &Tick) {
        let price = tick.price();
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += tick.volume();
    }

    /// Inclusive window start, in milliseconds.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Exclusive window end, in milliseconds.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// First trade price in the window.
    pub fn open(&self) -> f64 {
        self.open
    }

    /// Highest trade price.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Lowest trade price.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Last trade price in the window.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Summed trade volume.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Window start as a UTC datetime, if representable.
    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.start).ok().and_then(DateTime::from_timestamp_millis)
    }

    /// Window end as a UTC datetime, if representable.
    pub fn close_time(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.end).ok().and_then(DateTime::from_timestamp_millis)
    }
}

/// Groups trades into fixed, epoch-aligned time windows.
///
/// At most one bar is in progress. It is sealed and returned by [`update`](Self::update) as soon as
/// a trade falls into a different window, and a new bar is opened from that trade.
#[derive(Debug, Clone)]
pub struct BarAggregator {
    window_size: u64,
    current: Option<Bar>,
}

impl BarAggregator {
    /// Creates an aggregator with windows of `window_size` milliseconds.
    ///
    /// ### Returns
    /// The aggregator, or [`Error::ZeroWindowSize`] when `window_size` is zero.
    pub fn new(window_size: u64) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::ZeroWindowSize);
        }
        Ok(Self {
            window_size,
            current: None,
        })
    }

    /// Window length in milliseconds.
    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Feeds a trade.
    ///
    /// ### Returns
    /// The sealed bar when `tick` opens a new window, `None` otherwise.
    pub fn update(&mut self, tick: &Tick) -> Option<Bar> {
        let start = tick.timestamp() / self.window_size * self.window_size;

        if let Some(bar) = self.current.as_mut().filter(|bar| bar.start == start) {
            bar.push(tick);
            return None;
        }
        self.current.replace(Bar::seed(start, self.window_size, tick))
    }

    /// Returns the in-progress bar without sealing it.
    pub fn flush(&self) -> Option<Bar> {
        self.current
    }
}
