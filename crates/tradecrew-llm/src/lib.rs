//! LLM transport layer for the tradecrew pipeline.
//!
//! Exposes a single [`LlmClient`] trait (`generate` + `is_available`)
//! over three HTTP backends: Ollama, OpenAI, and LM Studio. All
//! backends sit behind a retry wrapper that re-attempts transient
//! transport failures with a fixed delay and passes configuration
//! errors through immediately.

pub mod backends;
pub mod client;
pub mod config;
pub mod error;
pub mod provider;

pub use client::LlmClient;
pub use config::{LlmBackend, LlmConfig};
pub use error::{LlmError, Result};
pub use provider::{RetryingClient, build_client};
