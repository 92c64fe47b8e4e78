//! Result and event record types

use crate::{AgentRole, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Output of a single agent invocation.
///
/// Immutable after construction except for `details`, an open
/// diagnostic side channel callers may attach metadata to. The
/// `signal` field always comes out of the normalization path, so it
/// is guaranteed to be a member of the role's fixed vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub agent_role: AgentRole,
    pub ticker: String,
    pub summary: String,
    pub signal: Signal,
    /// Signal strength on a 0-100 scale, not a calibrated probability.
    pub confidence: f64,
    pub details: HashMap<String, serde_json::Value>,
}

impl AnalysisResult {
    pub fn new(
        agent_role: AgentRole,
        ticker: impl Into<String>,
        summary: impl Into<String>,
        signal: Signal,
        confidence: f64,
    ) -> Self {
        Self {
            agent_role,
            ticker: ticker.into(),
            summary: summary.into(),
            signal,
            confidence,
            details: HashMap::new(),
        }
    }

    /// Placeholder emitted when an analyst invocation fails.
    ///
    /// The fan-out stage always contributes one entry per analyst,
    /// so failures are represented rather than dropped.
    pub fn failure(agent_role: AgentRole, ticker: impl Into<String>, error: &str) -> Self {
        Self::new(
            agent_role,
            ticker,
            format!("Analysis failed: {error}"),
            Signal::Neutral,
            0.0,
        )
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub fn add_detail(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.details.insert(key.into(), value);
    }

    /// Whether this result is a failure placeholder.
    pub fn is_failure(&self) -> bool {
        self.confidence == 0.0 && self.summary.to_lowercase().contains("failed")
    }
}

/// Completion status of a pipeline step event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Completed,
    Error,
}

/// A progress event emitted at the start and end of every stage.
///
/// The event stream is the only channel through which progress is
/// observable before the final decision is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    pub data: HashMap<String, serde_json::Value>,
    pub error: Option<String>,
}

impl StepResult {
    pub fn pending(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Pending,
            data: HashMap::new(),
            error: None,
        }
    }

    pub fn completed(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Completed,
            data: HashMap::new(),
            error: None,
        }
    }

    pub fn error(step_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Error,
            data: HashMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// One bull/bear rebuttal exchange within the research-debate stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    /// 1-based round number.
    pub round: u32,
    pub bull: String,
    pub bear: String,
}

/// Immutable snapshot of one full pipeline run.
///
/// Constructed exactly once at the end of `propagate` and owned by
/// the caller; runs are independent of each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingDecision {
    pub ticker: String,
    pub analysis_date: String,
    pub final_signal: Signal,
    pub final_confidence: f64,
    pub trader_summary: String,
    pub risk_assessment: String,
    pub verification_summary: String,
    pub verification_issues: Vec<String>,
    pub analyst_reports: Vec<AnalysisResult>,
    pub debate_history: Vec<DebateRound>,
    pub steps: Vec<StepResult>,
    /// Company fundamentals captured at fetch time, fields nullable.
    pub stock_info: HashMap<String, serde_json::Value>,
    pub indicators: HashMap<String, f64>,
    /// Qualitative per-indicator readings derived from the indicators.
    pub signals: HashMap<String, String>,
    /// Number of price rows the analysis was based on.
    pub price_rows: usize,
    pub generated_at: DateTime<Utc>,
}
