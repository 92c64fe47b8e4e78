//! HTTP backend implementations

pub mod lmstudio;
pub mod ollama;
pub mod openai;

pub use lmstudio::LmStudioClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
