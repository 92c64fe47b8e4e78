//! The risk manager role
//!
//! Uses its own verdict vocabulary instead of trade signals. The
//! response is scanned for verdict keywords in a fixed priority order:
//! reject first, then modify, then approve, with review as the
//! fallback. A response mentioning several terms resolves to the
//! first match.

use super::{RoleAgent, clip};
use crate::graph::PipelineState;
use serde_json::json;
use std::sync::Arc;
use tradecrew_core::{AgentRole, AnalysisResult, Signal};
use tradecrew_llm::LlmClient;

const RISK_SYSTEM_PROMPT: &str = "You are the risk manager. Review the \
    trader's proposed decision against the analyst evidence and the \
    portfolio's risk tolerance. Your verdict must be one word first - \
    APPROVE, MODIFY, or REJECT - followed by your reasoning. Use REJECT \
    when the decision is unsafe, MODIFY when the direction is right but \
    the sizing or confidence is too aggressive.";

pub struct RiskManager {
    llm: Arc<dyn LlmClient>,
}

impl RiskManager {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

/// Keyword scan with fixed priority: reject, modify, approve, review.
pub fn parse_risk_verdict(response: &str) -> (Signal, f64) {
    let lower = response.to_lowercase();
    if lower.contains("reject") {
        (Signal::Reject, 80.0)
    } else if lower.contains("modify") {
        (Signal::Modify, 65.0)
    } else if lower.contains("approve") {
        (Signal::Approve, 75.0)
    } else {
        (Signal::Review, 50.0)
    }
}

impl RoleAgent for RiskManager {
    fn role(&self) -> AgentRole {
        AgentRole::RiskManager
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        RISK_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        format!(
            "Review this proposed trade for {} (risk tolerance: {}).\n\n\
             Proposed decision: {} at {:.0}% confidence.\n\n\
             Trader's reasoning:\n{}\n\n\
             Technical read: {} ({:.1}% agreement). {} analyst reports were \
             considered.\n\n\
             State your verdict (APPROVE, MODIFY, or REJECT) and why.",
            state.ticker,
            state.risk_tolerance,
            state.trader_signal,
            state.trader_confidence,
            clip(&state.trader_summary, 1000),
            state.signals.overall,
            state.signals.confidence,
            state.analyst_reports.len()
        )
    }

    fn parse_response(&self, ticker: &str, response: &str) -> AnalysisResult {
        let (verdict, confidence) = parse_risk_verdict(response);
        AnalysisResult::new(self.role(), ticker, response, verdict, confidence)
    }

    fn attach_details(&self, result: &mut AnalysisResult, state: &PipelineState) {
        result.add_detail("trader_signal", json!(state.trader_signal));
    }
}
