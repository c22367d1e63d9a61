//! Synthetic market data.
//!
//! Prices follow a geometric Brownian motion with Bernoulli-triggered log-normal jumps, stepped once
//! per period of the configured [`TimeFrame`]:
//!
//! ```text
//! dt    = 1 / (252 * ticks_per_day)
//! dS    = (mu - sigma^2 / 2) dt + sigma Z sqrt(dt)
//! price = price * exp(dS) * J,   J = exp(N(jump_mu, jump_sigma)) with probability lambda, else 1
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::engine::{QuoteTick, Tick, TimeFrame};
use crate::errors::{Error, Result};

/// Narrowest spread a generated quote can have.
pub const MIN_SPREAD: f64 = 0.001;

/// Parameters of the price process. Rates are annualized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbmParams {
    /// Price before the first step. Must be positive.
    pub start_price: f64,
    /// Drift.
    pub mu: f64,
    /// Volatility.
    pub sigma: f64,
    /// Probability of a jump at each step.
    pub jump_lambda: f64,
    /// Mean of the log jump size.
    pub jump_mu: f64,
    /// Standard deviation of the log jump size.
    pub jump_sigma: f64,
}

impl GbmParams {
    /// Checks that the start price is positive, the jump probability lies in `[0, 1]` and both
    /// standard deviations are finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(Error::Distribution(format!(
                "start_price must be positive (got: {})",
                self.start_price
            )));
        }
        if !(0.0..=1.0).contains(&self.jump_lambda) {
            return Err(Error::Distribution(format!(
                "jump_lambda must be in [0, 1] (got: {})",
                self.jump_lambda
            )));
        }
        check_std_dev("sigma", self.sigma)?;
        check_std_dev("jump_sigma", self.jump_sigma)
    }
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            mu: 0.03,
            sigma: 0.2,
            jump_lambda: 0.01,
            jump_mu: -0.01,
            jump_sigma: 0.03,
        }
    }
}

/// Distribution of the absolute bid/ask spread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadParams {
    /// Mean spread.
    pub mu: f64,
    /// Standard deviation of the spread.
    pub sigma: f64,
}

impl SpreadParams {
    /// Checks that `sigma` is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        check_std_dev("spread sigma", self.sigma)
    }
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self { mu: 0.01, sigma: 0.002 }
    }
}

// rand_distr only rejects a non-finite standard deviation.
fn check_std_dev(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Distribution(format!("{name} must be finite and non-negative (got: {value})")))
    }
}

// Price state shared by both generators.
struct PricePath {
    price: f64,
    drift: f64,
    diffusion: f64,
    jump_lambda: f64,
    jump: Normal<f64>,
}

impl PricePath {
    fn new(params: &GbmParams, time_frame: TimeFrame) -> Result<Self> {
        params.validate()?;
        let dt = 1.0 / time_frame.periods_per_year();
        Ok(Self {
            price: params.start_price,
            drift: (params.mu - 0.5 * params.sigma * params.sigma) * dt,
            diffusion: params.sigma * dt.sqrt(),
            jump_lambda: params.jump_lambda,
            jump: Normal::new(params.jump_mu, params.jump_sigma)?,
        })
    }

    fn step<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        let ds = self.drift + self.diffusion * z;

        let jump_factor = if rng.random::<f64>() < self.jump_lambda {
            self.jump.sample(rng).exp()
        } else {
            1.0
        };

        self.price *= ds.exp() * jump_factor;
        self.price
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn random_volume<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(0.5..1.5)
}

/// Generates trade ticks.
pub struct GbmJumpGenerator {
    rng: StdRng,
    n_ticks: usize,
    time_frame: TimeFrame,
    params: GbmParams,
}

impl GbmJumpGenerator {
    /// Creates a generator of `n_ticks` trades, one per `time_frame` period.
    ///
    /// ### Arguments
    /// * `seed` - Makes the output reproducible; OS entropy when `None`.
    pub fn new(n_ticks: usize, time_frame: TimeFrame, params: GbmParams, seed: Option<u64>) -> Self {
        Self {
            rng: rng_from(seed),
            n_ticks,
            time_frame,
            params,
        }
    }

    /// Generates the series.
    ///
    /// ### Returns
    /// The ticks, or an error when the jump distribution parameters are invalid.
    pub fn generate_ticks(&mut self) -> Result<Vec<Tick>> {
        let mut path = PricePath::new(&self.params, self.time_frame)?;
        let step_ms = self.time_frame.millis();

        let ticks = (0..self.n_ticks as u64)
            .map(|i| {
                let price = path.step(&mut self.rng);
                let volume = random_volume(&mut self.rng);
                Tick::from((i * step_ms, price, volume))
            })
            .collect();
        Ok(ticks)
    }
}

/// Generates quote ticks around a jump-diffusion midpoint.
pub struct QuoteGbmJumpGenerator {
    rng: StdRng,
    n_ticks: usize,
    time_frame: TimeFrame,
    params: GbmParams,
    spread: SpreadParams,
}

impl QuoteGbmJumpGenerator {
    /// Creates a generator of `n_ticks` quotes, one per `time_frame` period.
    pub fn new(
        n_ticks: usize,
        time_frame: TimeFrame,
        params: GbmParams,
        spread: SpreadParams,
        seed: Option<u64>,
    ) -> Self {
        Self {
            rng: rng_from(seed),
            n_ticks,
            time_frame,
            params,
            spread,
        }
    }

    /// Generates the series. Spreads are floored at [`MIN_SPREAD`].
    pub fn generate_ticks(&mut self) -> Result<Vec<QuoteTick>> {
        let mut path = PricePath::new(&self.params, self.time_frame)?;
        self.spread.validate()?;
        let spread_dist = Normal::new(self.spread.mu, self.spread.sigma)?;
        let step_ms = self.time_frame.millis();

        let quotes = (0..self.n_ticks as u64)
            .map(|i| {
                let mid = path.step(&mut self.rng);
                let volume = random_volume(&mut self.rng);
                let spread = spread_dist.sample(&mut self.rng).max(MIN_SPREAD);
                QuoteTick::from((i * step_ms, mid - spread / 2.0, mid + spread / 2.0, volume))
            })
            .collect();
        Ok(quotes)
    }
}
