//! Error types for pipeline operations

use thiserror::Error;
use tradecrew_data::DataError;
use tradecrew_llm::LlmError;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can abort a pipeline or screener run.
///
/// Only the data-fetch stage is fatal; agent failures inside later
/// stages degrade the run and never surface through this type.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Fatal stage-1 failure - nothing to analyze without price data
    #[error("data fetch failed: {0}")]
    DataFetch(#[from] DataError),

    /// LLM transport failure that escaped an agent invocation
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Empty or unusable input to a batch run
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
