//! Ready-made strategies.
//!
//! - [`MeanReversion`]: buys dips, sells small rebounds (trades).
//! - [`Breakout`]: follows breaks of a rolling high/low channel (trades).
//! - [`Spread`]: quotes both sides around the touch with limit orders (quotes).

mod breakout;
mod mean_reversion;
mod spread;

pub use breakout::*;
pub use mean_reversion::*;
pub use spread::*;
