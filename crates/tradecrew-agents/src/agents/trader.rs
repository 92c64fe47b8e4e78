//! The trader role - synthesizes everything into one verdict

use super::{RoleAgent, clip};
use crate::graph::PipelineState;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;
use tradecrew_core::{AgentRole, AnalysisResult};
use tradecrew_llm::LlmClient;

const TRADER_SYSTEM_PROMPT: &str = "You are the head trader. You weigh every \
    analyst report and the full bull/bear debate, then commit to a single \
    trading decision. Respond with a JSON object containing \"signal\" (one \
    of strong_buy, buy, hold, sell, strong_sell), \"confidence\" (0-100), \
    and \"summary\" explaining the decision and a sensible position size.";

pub struct Trader {
    llm: Arc<dyn LlmClient>,
}

impl Trader {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

impl RoleAgent for Trader {
    fn role(&self) -> AgentRole {
        AgentRole::Trader
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        TRADER_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let mut prompt = format!(
            "Decide a trade for {} as of {}. Risk tolerance: {}.\n\nAnalyst reports:\n",
            state.ticker, state.analysis_date, state.risk_tolerance
        );

        for report in &state.analyst_reports {
            let _ = writeln!(
                prompt,
                "[{}] signal={} confidence={:.0}\n{}",
                report.agent_role.display_name(),
                report.signal,
                report.confidence,
                clip(&report.summary, 500)
            );
        }
        if state.analyst_reports.is_empty() {
            prompt.push_str("(no analyst reports available)\n");
        }

        if !state.debate_history.is_empty() {
            prompt.push_str("\nBull/bear debate:\n");
            for round in &state.debate_history {
                let _ = writeln!(
                    prompt,
                    "Round {}:\nBULL: {}\nBEAR: {}",
                    round.round,
                    clip(&round.bull, 500),
                    clip(&round.bear, 500)
                );
            }
        }

        prompt
    }

    fn attach_details(&self, result: &mut AnalysisResult, state: &PipelineState) {
        result.add_detail(
            "inputs_used",
            json!({
                "analyst_reports": state.analyst_reports.len(),
                "debate_rounds": state.debate_history.len(),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskTolerance;
    use tradecrew_core::{DebateRound, Signal};

    fn noop_llm() -> Arc<dyn LlmClient> {
        struct Noop;
        #[async_trait::async_trait]
        impl LlmClient for Noop {
            async fn generate(
                &self,
                _prompt: &str,
                _system_prompt: &str,
            ) -> tradecrew_llm::Result<String> {
                Ok(String::new())
            }
            async fn is_available(&self) -> bool {
                true
            }
        }
        Arc::new(Noop)
    }

    #[test]
    fn test_prompt_includes_debate_and_reports() {
        let mut state =
            PipelineState::new("MSFT", "2025-08-01", RiskTolerance::Aggressive, 2, 90);
        state.analyst_reports.push(AnalysisResult::new(
            AgentRole::TechnicalAnalyst,
            "MSFT",
            "Uptrend intact.",
            Signal::Buy,
            65.0,
        ));
        state.debate_history.push(DebateRound {
            round: 1,
            bull: "Cloud growth compounds.".to_string(),
            bear: "Valuation is stretched.".to_string(),
        });

        let prompt = Trader::new(noop_llm()).build_prompt(&state);
        assert!(prompt.contains("Risk tolerance: aggressive"));
        assert!(prompt.contains("Uptrend intact."));
        assert!(prompt.contains("BULL: Cloud growth compounds."));
        assert!(prompt.contains("BEAR: Valuation is stretched."));
    }

    #[test]
    fn test_details_count_inputs() {
        let mut state =
            PipelineState::new("MSFT", "2025-08-01", RiskTolerance::Moderate, 2, 90);
        state.debate_history.push(DebateRound {
            round: 1,
            bull: "b".to_string(),
            bear: "r".to_string(),
        });

        let trader = Trader::new(noop_llm());
        let mut result =
            AnalysisResult::new(AgentRole::Trader, "MSFT", "buy it", Signal::Buy, 70.0);
        trader.attach_details(&mut result, &state);
        assert_eq!(result.details["inputs_used"]["debate_rounds"], 1);
    }
}
