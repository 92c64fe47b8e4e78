//! LLM backend selection and configuration

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Which LLM backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    /// Local Ollama server (default, no API key required)
    Ollama,
    /// OpenAI chat-completions API (requires API key)
    OpenAi,
    /// Local LM Studio server speaking the OpenAI wire format
    LmStudio,
}

impl Default for LlmBackend {
    fn default() -> Self {
        Self::Ollama
    }
}

impl FromStr for LlmBackend {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "lmstudio" | "lm_studio" => Ok(Self::LmStudio),
            other => Err(LlmError::Configuration(format!(
                "unsupported LLM provider '{other}' (expected ollama, openai, or lmstudio)"
            ))),
        }
    }
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::LmStudio => "lmstudio",
        };
        f.write_str(name)
    }
}

/// Configuration for the LLM transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub backend: LlmBackend,

    /// Model name passed to the backend
    pub model: String,

    /// Base URL for a local Ollama server
    pub ollama_base_url: String,

    /// Base URL for a local LM Studio server
    pub lmstudio_base_url: String,

    /// OpenAI API key (required only for the OpenAI backend)
    pub openai_api_key: Option<String>,

    /// Sampling temperature forwarded to the backend
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            lmstudio_base_url: DEFAULT_LMSTUDIO_BASE_URL.to_string(),
            openai_api_key: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `LLM_PROVIDER`, `OLLAMA_MODEL`, `OLLAMA_BASE_URL`,
    /// `LMSTUDIO_BASE_URL`, `OPENAI_MODEL`, and `OPENAI_API_KEY`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.backend = provider.parse()?;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.model = model;
        }
        if config.backend == LlmBackend::OpenAi {
            config.model = std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            config.ollama_base_url = url;
        }
        if let Ok(url) = std::env::var("LMSTUDIO_BASE_URL") {
            config.lmstudio_base_url = url;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.openai_api_key = Some(key);
            }
        }

        Ok(config)
    }

    pub fn with_backend(mut self, backend: LlmBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Validate the configuration for the selected backend.
    pub fn validate(&self) -> Result<()> {
        if self.backend == LlmBackend::OpenAi
            && self.openai_api_key.as_deref().unwrap_or_default().is_empty()
        {
            return Err(LlmError::Configuration(
                "OPENAI_API_KEY is required for the openai provider".to_string(),
            ));
        }
        if self.model.is_empty() {
            return Err(LlmError::Configuration("model name is empty".to_string()));
        }
        Ok(())
    }
}
