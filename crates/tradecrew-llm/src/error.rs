//! Error types for LLM transport

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur while talking to an LLM backend.
///
/// The variants are transport-distinguishable so the retry policy can
/// decide whether another attempt is worthwhile.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Could not reach the backend at all
    #[error("connection to LLM backend failed: {0}")]
    ConnectionFailed(String),

    /// Request was sent but the backend did not answer in time
    #[error("LLM request timed out: {0}")]
    Timeout(String),

    /// Backend answered with an error status or an unusable body
    #[error("bad response from LLM backend: {0}")]
    BadResponse(String),

    /// Misconfiguration - unsupported provider, missing API key
    #[error("LLM configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Transient transport failures are retried; configuration errors
    /// raise immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout(_) | Self::BadResponse(_)
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::BadResponse(err.to_string())
        }
    }
}
