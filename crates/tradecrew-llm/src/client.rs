//! The client trait every backend implements

use crate::error::Result;
use async_trait::async_trait;

/// Minimal surface the pipeline needs from an LLM backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a prompt with a role-specific system prompt and return the
    /// raw text reply.
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String>;

    /// Health probe. Must not raise; an unreachable backend is `false`.
    async fn is_available(&self) -> bool;
}
