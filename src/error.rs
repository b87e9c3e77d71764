use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    /// A raw kline row did not carry a usable value for one of its fields.
    #[error("Malformed kline at row {row}: invalid {field}")]
    MalformedKline { row: usize, field: &'static str },

    /// Timestamps must be strictly ascending within one sequence.
    #[error("Unordered sequence for {symbol}: timestamp {timestamp} at row {row} is not after its predecessor")]
    UnorderedSequence {
        symbol: String,
        row: usize,
        timestamp: i64,
    },

    #[error("Invalid market: {0}")]
    InvalidMarket(String),

    #[error("Invalid series key: {0}")]
    InvalidSeriesKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
