use crate::engine::EventKind;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the engine, the generators and the exporters.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The event series matching the strategy's kind is empty. A run requires at least one event.
    #[error("No {kind} data available for strategy `{strategy}`")]
    NoEventData {
        /// Name the strategy was registered under.
        strategy: String,
        /// Kind of events the strategy consumes.
        kind: EventKind,
    },

    /// Another registered strategy already uses this name.
    #[error("Strategy `{0}` is already registered")]
    DuplicateStrategy(String),

    /// Strategy names must be non-empty and free of path separators.
    #[error("Invalid strategy name `{0}`")]
    InvalidStrategyName(String),

    /// A bar window must span at least one millisecond.
    #[error("Bar window size must be positive")]
    ZeroWindowSize,

    /// The tick count is outside the accepted range.
    #[error("Tick count must be between {min} and {max} (got: {0})", min = crate::config::MIN_TICKS, max = crate::config::MAX_TICKS)]
    TickCountOutOfRange(usize),

    /// The initial capital is outside the accepted range.
    #[error("Initial capital must be in (0, {max}] (got: {0})", max = crate::config::MAX_CAPITAL)]
    CapitalOutOfRange(f64),

    /// A distribution could not be built from the generator parameters.
    #[error("Invalid generator parameter: {0}")]
    Distribution(String),

    /// The shared output sink lock was poisoned by a panicking writer.
    #[error("Output sink lock poisoned: {0}")]
    Mutex(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV writing error occurred.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization/deserialization error occurred.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<rand_distr::NormalError> for Error {
    fn from(value: rand_distr::NormalError) -> Self {
        Self::Distribution(value.to_string())
    }
}
