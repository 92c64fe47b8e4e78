//! The verifier role
//!
//! Final consistency check over the whole run. Expects a JSON object
//! with `verdict`, `confidence_adjustment`, `issues`, and `summary`;
//! reported confidence is approval strength (`100 + adjustment`,
//! floored at 0), not a probability. When JSON parsing fails the
//! verdict is recovered by substring scan over the raw text with a
//! fixed confidence of 70 and no adjustment.

use super::{RoleAgent, clip};
use crate::graph::PipelineState;
use crate::parser;
use serde_json::{Value, json};
use std::fmt::Write;
use std::sync::Arc;
use tradecrew_core::{AgentRole, AnalysisResult, Signal};
use tradecrew_llm::LlmClient;

const VERIFIER_SYSTEM_PROMPT: &str = "You are the verification agent. \
    Cross-check the final decision against every analyst report and the \
    risk assessment, looking for contradictions, stale data, and \
    overconfidence. Respond with a JSON object containing \"verdict\" \
    (approved, flagged, or rejected), \"confidence_adjustment\" (an integer \
    from -30 to 0), \"issues\" (a list of strings), and \"summary\".";

const FALLBACK_CONFIDENCE: f64 = 70.0;

pub struct Verifier {
    llm: Arc<dyn LlmClient>,
}

impl Verifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

/// Substring verdict mapping, checked in order; flagged is both an
/// explicit match and the fail-safe default.
fn map_verdict(raw: &str) -> Signal {
    let lower = raw.to_lowercase();
    if lower.contains("approved") || lower.contains("approve") {
        Signal::Approved
    } else if lower.contains("rejected") || lower.contains("reject") {
        Signal::Rejected
    } else {
        Signal::Flagged
    }
}

impl RoleAgent for Verifier {
    fn role(&self) -> AgentRole {
        AgentRole::Verifier
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        VERIFIER_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let mut prompt = format!(
            "Verify this completed analysis of {} dated {}.\n\n\
             Final decision: {} at {:.0}% confidence.\n\nTrader summary:\n{}\n",
            state.ticker,
            state.analysis_date,
            state.final_signal,
            state.final_confidence,
            clip(&state.trader_summary, 1000)
        );

        if !state.risk_assessment.is_empty() {
            let _ = write!(
                prompt,
                "\nRisk assessment:\n{}\n",
                clip(&state.risk_assessment, 1000)
            );
        }

        prompt.push_str("\nAnalyst reports:\n");
        for report in &state.analyst_reports {
            let _ = writeln!(
                prompt,
                "[{}] signal={} confidence={:.0}\n{}",
                report.agent_role.display_name(),
                report.signal,
                report.confidence,
                clip(&report.summary, 400)
            );
        }

        prompt
    }

    fn parse_response(&self, ticker: &str, response: &str) -> AnalysisResult {
        if let Some(obj) = parser::extract_json_object(response) {
            let verdict = map_verdict(
                obj.get("verdict").and_then(Value::as_str).unwrap_or_default(),
            );
            let adjustment = obj
                .get("confidence_adjustment")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            let issues: Vec<String> = obj
                .get("issues")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let summary = obj
                .get("summary")
                .and_then(Value::as_str)
                .map_or_else(|| response.to_string(), str::to_string);

            let confidence = (100.0 + adjustment as f64).max(0.0);
            let mut result = AnalysisResult::new(self.role(), ticker, summary, verdict, confidence);
            result.add_detail("confidence_adjustment", json!(adjustment));
            result.add_detail("issues", json!(issues));
            result
        } else {
            let verdict = map_verdict(response);
            let mut result = AnalysisResult::new(
                self.role(),
                ticker,
                response,
                verdict,
                FALLBACK_CONFIDENCE,
            );
            result.add_detail("confidence_adjustment", json!(0));
            result.add_detail("issues", json!([]));
            result
        }
    }
}
