//! The debating researcher roles

use super::{RoleAgent, clip};
use crate::error::Result;
use crate::graph::PipelineState;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;
use tradecrew_core::{AgentRole, AnalysisResult};
use tradecrew_llm::LlmClient;

const BULL_SYSTEM_PROMPT: &str = "You are the bull-case researcher. Build the \
    strongest honest argument for owning this stock from the analyst \
    reports, and defend it against the bear case without ignoring real \
    risks. Respond with a JSON object containing \"signal\", \"confidence\" \
    (0-100), and \"summary\".";

const BEAR_SYSTEM_PROMPT: &str = "You are the bear-case researcher. Build the \
    strongest honest argument against owning this stock from the analyst \
    reports, and defend it against the bull case without inventing \
    problems. Respond with a JSON object containing \"signal\", \
    \"confidence\" (0-100), and \"summary\".";

fn analyst_report_block(state: &PipelineState) -> String {
    let mut block = String::new();
    for report in &state.analyst_reports {
        let _ = writeln!(
            block,
            "[{}] signal={} confidence={:.0}\n{}",
            report.agent_role.display_name(),
            report.signal,
            report.confidence,
            clip(&report.summary, 500)
        );
    }
    if block.is_empty() {
        block.push_str("(no analyst reports available)\n");
    }
    block
}

fn opening_prompt(side: &str, state: &PipelineState) -> String {
    format!(
        "Construct the {side} case for {} as of {}.\n\nAnalyst reports:\n{}",
        state.ticker,
        state.analysis_date,
        analyst_report_block(state)
    )
}

fn rebuttal_prompt(side: &str, state: &PipelineState, opponent: &str) -> String {
    format!(
        "You are continuing the {side} case for {}. Rebut the opposing \
         argument below point by point, conceding only what the evidence \
         forces you to concede.\n\nOpposing argument:\n{}\n\nAnalyst reports \
         for reference:\n{}",
        state.ticker,
        clip(opponent, 1500),
        analyst_report_block(state)
    )
}

pub struct BullResearcher {
    llm: Arc<dyn LlmClient>,
}

impl BullResearcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// One rebuttal round: returns the new bull argument text.
    pub async fn rebut(&self, state: &PipelineState, opponent: &str) -> Result<String> {
        let prompt = rebuttal_prompt("bull", state, opponent);
        Ok(self.llm.generate(&prompt, BULL_SYSTEM_PROMPT).await?)
    }
}

impl RoleAgent for BullResearcher {
    fn role(&self) -> AgentRole {
        AgentRole::BullResearcher
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        BULL_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        opening_prompt("bull", state)
    }

    fn attach_details(&self, result: &mut AnalysisResult, _state: &PipelineState) {
        result.add_detail("perspective", json!("bull"));
    }
}

pub struct BearResearcher {
    llm: Arc<dyn LlmClient>,
}

impl BearResearcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// One rebuttal round: returns the new bear argument text.
    pub async fn rebut(&self, state: &PipelineState, opponent: &str) -> Result<String> {
        let prompt = rebuttal_prompt("bear", state, opponent);
        Ok(self.llm.generate(&prompt, BEAR_SYSTEM_PROMPT).await?)
    }
}

impl RoleAgent for BearResearcher {
    fn role(&self) -> AgentRole {
        AgentRole::BearResearcher
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        BEAR_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        opening_prompt("bear", state)
    }

    fn attach_details(&self, result: &mut AnalysisResult, _state: &PipelineState) {
        result.add_detail("perspective", json!("bear"));
    }
}
