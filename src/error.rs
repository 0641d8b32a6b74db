use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarmError {
    #[error("{action}: retry attempts have been reached ({attempts} tried)")]
    RetriesExhausted {
        action: String,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Random(#[from] RandomError),

    #[error("token `{0}` is not configured")]
    UnknownToken(String),

    #[error("{symbol} balance is not available: {reason}")]
    BalanceUnavailable { symbol: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("decimals {0} exceed the supported precision of 28")]
    UnsupportedDecimals(u32),

    #[error("amount {0} is negative")]
    Negative(String),

    #[error("amount overflows base units: {0}")]
    Overflow(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RandomError {
    #[error("empty range: [{min}, {max}]")]
    EmptyRange { min: String, max: String },

    #[error("cannot choose from an empty set")]
    EmptySet,

    #[error("cannot choose {requested} items from a set of {available}")]
    NotEnoughItems { requested: usize, available: usize },

    #[error("count must be positive")]
    ZeroCount,
}
