//! Error types for data operations

use thiserror::Error;

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while fetching or deriving market data.
#[derive(Error, Debug)]
pub enum DataError {
    /// No price data exists for the ticker
    #[error("no price data found for {0}")]
    NotFound(String),

    /// Upstream fetch failed
    #[error("data fetch failed: {0}")]
    Fetch(String),

    /// Not enough price rows to compute indicators
    #[error("insufficient data: need at least {required} price rows, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected payload shape
    #[error("unexpected response format: {0}")]
    UnexpectedResponse(String),
}
