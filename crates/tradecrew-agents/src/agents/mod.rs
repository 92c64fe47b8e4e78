//! Role agents
//!
//! One capability per role: build a prompt from the accumulated state,
//! invoke the LLM, parse the reply. The orchestrator holds one
//! instance per role and never dispatches by name.

pub mod analysts;
pub mod researchers;
pub mod risk_manager;
pub mod trader;
pub mod verifier;

pub use analysts::{FundamentalAnalyst, NewsAnalyst, SentimentAnalyst, TechnicalAnalyst};
pub use researchers::{BearResearcher, BullResearcher};
pub use risk_manager::RiskManager;
pub use trader::Trader;
pub use verifier::Verifier;

use crate::error::Result;
use crate::graph::PipelineState;
use crate::parser;
use async_trait::async_trait;
use std::sync::Arc;
use tradecrew_core::{AgentRole, AnalysisResult};
use tradecrew_llm::LlmClient;

/// Shared contract for all nine roles.
#[async_trait]
pub trait RoleAgent: Send + Sync {
    fn role(&self) -> AgentRole;

    fn llm(&self) -> &Arc<dyn LlmClient>;

    fn system_prompt(&self) -> &str;

    /// Format this role's slice of the state into a user prompt.
    fn build_prompt(&self, state: &PipelineState) -> String;

    /// Parse the raw reply. Roles with their own response contract
    /// (risk manager, verifier) override this.
    fn parse_response(&self, ticker: &str, response: &str) -> AnalysisResult {
        parser::parse_response(self.role(), ticker, response)
    }

    /// Hook for attaching role-specific diagnostic details.
    fn attach_details(&self, _result: &mut AnalysisResult, _state: &PipelineState) {}

    /// One full invocation: prompt, generate, parse.
    async fn analyze(&self, state: &PipelineState) -> Result<AnalysisResult> {
        let prompt = self.build_prompt(state);
        let response = self.llm().generate(&prompt, self.system_prompt()).await?;
        let mut result = self.parse_response(&state.ticker, &response);
        self.attach_details(&mut result, state);
        Ok(result)
    }
}

/// Truncate free text for prompt embedding, keeping whole characters.
pub(crate) fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_short_text_untouched() {
        assert_eq!(clip("hello", 10), "hello");
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        assert_eq!(clip("héllo world", 5), "héllo");
    }
}
