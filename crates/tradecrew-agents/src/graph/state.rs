//! Pipeline state record and stage-patch merging
//!
//! Each stage reads the accumulated state and returns a `StatePatch`.
//! Accumulator fields (analyst reports, debate history, steps) merge
//! by list concatenation so concurrent producers never overwrite each
//! other; scalar fields take the latest writer.

use crate::config::RiskTolerance;
use std::collections::BTreeMap;
use tradecrew_core::{AnalysisResult, DebateRound, Signal, StepResult};
use tradecrew_data::{Filing, NewsItem, PriceBar, SignalSummary, StockInfo, TrendSummary};

/// The single mutable record threaded through all six stages.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub ticker: String,
    pub analysis_date: String,
    pub risk_tolerance: RiskTolerance,
    pub max_debate_rounds: u32,
    pub period_days: u32,

    // Populated by the data-fetch stage
    pub stock_info: StockInfo,
    pub prices: Vec<PriceBar>,
    pub indicators: BTreeMap<String, f64>,
    pub signals: SignalSummary,
    pub news: Vec<NewsItem>,
    pub web_news: Vec<NewsItem>,
    pub filings: Vec<Filing>,
    pub trends: Option<TrendSummary>,

    // Accumulators, append-merged
    pub analyst_reports: Vec<AnalysisResult>,
    pub debate_history: Vec<DebateRound>,
    pub steps: Vec<StepResult>,

    // Scalars, overwritten by the latest writer
    pub trader_summary: String,
    pub trader_signal: Signal,
    pub trader_confidence: f64,
    pub final_signal: Signal,
    pub final_confidence: f64,
    pub risk_assessment: String,
    pub verification_summary: String,
    pub verification_issues: Vec<String>,
}

impl PipelineState {
    /// Fresh state for one run: empty accumulators, config-derived
    /// scalars, a hold stance until the trader writes one.
    pub fn new(
        ticker: impl Into<String>,
        analysis_date: impl Into<String>,
        risk_tolerance: RiskTolerance,
        max_debate_rounds: u32,
        period_days: u32,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            analysis_date: analysis_date.into(),
            risk_tolerance,
            max_debate_rounds,
            period_days,
            stock_info: StockInfo::default(),
            prices: Vec::new(),
            indicators: BTreeMap::new(),
            signals: SignalSummary::default(),
            news: Vec::new(),
            web_news: Vec::new(),
            filings: Vec::new(),
            trends: None,
            analyst_reports: Vec::new(),
            debate_history: Vec::new(),
            steps: Vec::new(),
            trader_summary: String::new(),
            trader_signal: Signal::Hold,
            trader_confidence: 50.0,
            final_signal: Signal::Hold,
            final_confidence: 50.0,
            risk_assessment: String::new(),
            verification_summary: String::new(),
            verification_issues: Vec::new(),
        }
    }
}

/// Partial state contribution produced by one stage.
#[derive(Debug, Default)]
pub struct StatePatch {
    pub stock_info: Option<StockInfo>,
    pub prices: Option<Vec<PriceBar>>,
    pub indicators: Option<BTreeMap<String, f64>>,
    pub signals: Option<SignalSummary>,
    pub news: Option<Vec<NewsItem>>,
    pub web_news: Option<Vec<NewsItem>>,
    pub filings: Option<Vec<Filing>>,
    pub trends: Option<TrendSummary>,

    pub analyst_reports: Vec<AnalysisResult>,
    pub debate_history: Vec<DebateRound>,
    pub steps: Vec<StepResult>,

    pub trader_summary: Option<String>,
    pub trader_signal: Option<Signal>,
    pub trader_confidence: Option<f64>,
    pub final_signal: Option<Signal>,
    pub final_confidence: Option<f64>,
    pub risk_assessment: Option<String>,
    pub verification_summary: Option<String>,
    pub verification_issues: Option<Vec<String>>,
}

impl StatePatch {
    /// Merge this patch into the state. Lists concatenate, scalars
    /// overwrite when set.
    pub fn apply(self, state: &mut PipelineState) {
        if let Some(info) = self.stock_info {
            state.stock_info = info;
        }
        if let Some(prices) = self.prices {
            state.prices = prices;
        }
        if let Some(indicators) = self.indicators {
            state.indicators = indicators;
        }
        if let Some(signals) = self.signals {
            state.signals = signals;
        }
        if let Some(news) = self.news {
            state.news = news;
        }
        if let Some(web_news) = self.web_news {
            state.web_news = web_news;
        }
        if let Some(filings) = self.filings {
            state.filings = filings;
        }
        if let Some(trends) = self.trends {
            state.trends = Some(trends);
        }

        state.analyst_reports.extend(self.analyst_reports);
        state.debate_history.extend(self.debate_history);
        state.steps.extend(self.steps);

        if let Some(summary) = self.trader_summary {
            state.trader_summary = summary;
        }
        if let Some(signal) = self.trader_signal {
            state.trader_signal = signal;
        }
        if let Some(confidence) = self.trader_confidence {
            state.trader_confidence = confidence;
        }
        if let Some(signal) = self.final_signal {
            state.final_signal = signal;
        }
        if let Some(confidence) = self.final_confidence {
            state.final_confidence = confidence;
        }
        if let Some(assessment) = self.risk_assessment {
            state.risk_assessment = assessment;
        }
        if let Some(summary) = self.verification_summary {
            state.verification_summary = summary;
        }
        if let Some(issues) = self.verification_issues {
            state.verification_issues = issues;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradecrew_core::AgentRole;

    fn state() -> PipelineState {
        PipelineState::new("AAPL", "2025-08-01", RiskTolerance::Moderate, 2, 90)
    }

    fn report(role: AgentRole) -> AnalysisResult {
        AnalysisResult::new(role, "AAPL", "summary", Signal::Buy, 70.0)
    }

    #[test]
    fn test_accumulators_concatenate() {
        let mut state = state();

        let first = StatePatch {
            analyst_reports: vec![report(AgentRole::FundamentalAnalyst)],
            ..StatePatch::default()
        };
        first.apply(&mut state);

        let second = StatePatch {
            analyst_reports: vec![
                report(AgentRole::NewsAnalyst),
                report(AgentRole::TechnicalAnalyst),
            ],
            ..StatePatch::default()
        };
        second.apply(&mut state);

        assert_eq!(state.analyst_reports.len(), 3);
        assert_eq!(
            state.analyst_reports[0].agent_role,
            AgentRole::FundamentalAnalyst
        );
    }

    #[test]
    fn test_scalars_take_latest_writer() {
        let mut state = state();

        StatePatch {
            final_signal: Some(Signal::Buy),
            final_confidence: Some(80.0),
            ..StatePatch::default()
        }
        .apply(&mut state);

        StatePatch {
            final_confidence: Some(40.0),
            ..StatePatch::default()
        }
        .apply(&mut state);

        // Unset fields leave the previous value in place
        assert_eq!(state.final_signal, Signal::Buy);
        assert!((state.final_confidence - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_patch_is_a_no_op() {
        let mut state = state();
        state.trader_summary = "keep me".to_string();
        StatePatch::default().apply(&mut state);
        assert_eq!(state.trader_summary, "keep me");
        assert!(state.analyst_reports.is_empty());
    }
}
