//! Backend construction and the retry wrapper

use crate::backends::{LmStudioClient, OllamaClient, OpenAiClient};
use crate::client::LlmClient;
use crate::config::{LlmBackend, LlmConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Build the configured backend wrapped in the retry policy.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    config.validate()?;

    let inner: Box<dyn LlmClient> = match config.backend {
        LlmBackend::Ollama => Box::new(OllamaClient::new(config)?),
        LlmBackend::OpenAi => Box::new(OpenAiClient::new(config)?),
        LlmBackend::LmStudio => Box::new(LmStudioClient::new(config)?),
    };

    Ok(Arc::new(RetryingClient::new(inner)))
}

/// Retries transient transport failures with a fixed delay.
///
/// Up to 3 attempts total. Configuration errors are never retried.
pub struct RetryingClient {
    inner: Box<dyn LlmClient>,
}

impl RetryingClient {
    pub fn new(inner: Box<dyn LlmClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.inner.generate(prompt, system_prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < MAX_RETRIES => {
                    warn!(attempt, error = %err, "LLM call failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyClient {
        calls: AtomicU32,
        succeed_on: u32,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        async fn generate(&self, _prompt: &str, _system_prompt: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok(format!("ok on attempt {call}"))
            } else {
                Err(LlmError::ConnectionFailed("refused".to_string()))
            }
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    struct MisconfiguredClient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmClient for MisconfiguredClient {
        async fn generate(&self, _prompt: &str, _system_prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Configuration("bad provider".to_string()))
        }

        async fn is_available(&self) -> bool {
            false
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let client = RetryingClient::new(Box::new(FlakyClient {
            calls: AtomicU32::new(0),
            succeed_on: 3,
        }));

        let reply = client.generate("hi", "system").await.unwrap();
        assert_eq!(reply, "ok on attempt 3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let client = RetryingClient::new(Box::new(FlakyClient {
            calls: AtomicU32::new(0),
            succeed_on: 10,
        }));

        let result = client.generate("hi", "system").await;
        assert!(matches!(result, Err(LlmError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_configuration_errors_fail_fast() {
        let inner = MisconfiguredClient {
            calls: AtomicU32::new(0),
        };
        let client = RetryingClient::new(Box::new(inner));

        let result = client.generate("hi", "system").await;
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_build_client_rejects_openai_without_key() {
        let config = LlmConfig::default().with_backend(LlmBackend::OpenAi);
        assert!(build_client(&config).is_err());
    }

    #[test]
    fn test_build_client_ollama_default() {
        let config = LlmConfig::default();
        assert!(build_client(&config).is_ok());
    }
}
