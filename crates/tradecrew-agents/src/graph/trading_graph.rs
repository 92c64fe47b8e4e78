//! The six-stage trading pipeline
//!
//! Fixed linear chain: fetch data, fan out four analysts, run the
//! bull/bear debate, synthesize the trade, apply the risk-review
//! policy, verify. Only the data fetch is fatal; every later stage
//! degrades to an empty contribution plus an error step event so the
//! run always reaches a best-effort decision.

use crate::agents::{
    BearResearcher, BullResearcher, FundamentalAnalyst, NewsAnalyst, RiskManager, RoleAgent,
    SentimentAnalyst, TechnicalAnalyst, Trader, Verifier,
};
use crate::config::TradingConfig;
use crate::error::Result;
use crate::graph::state::{PipelineState, StatePatch};
use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};
use tradecrew_core::{
    AgentRole, AnalysisResult, DebateRound, Signal, StepResult, StepStatus, TradingDecision,
};
use tradecrew_data::{MarketData, SourceStatus, TrendDirection, compute_indicators,
    summarize_signals};
use tradecrew_llm::LlmClient;

const STAGE_FETCH_DATA: &str = "fetch_data";
const STAGE_RUN_ANALYSTS: &str = "run_analysts";
const STAGE_RESEARCH_DEBATE: &str = "research_debate";
const STAGE_TRADER_DECISION: &str = "trader_decision";
const STAGE_RISK_REVIEW: &str = "risk_review";
const STAGE_VERIFICATION: &str = "verification";

/// Fire-and-forget progress callback. Panics inside the observer are
/// swallowed; the pipeline never blocks or fails on observer behavior.
pub type StepObserver = Arc<dyn Fn(&StepResult) + Send + Sync>;

pub struct TradingGraph {
    data: Arc<dyn MarketData>,
    config: TradingConfig,
    analysts: Vec<Arc<dyn RoleAgent>>,
    bull: BullResearcher,
    bear: BearResearcher,
    trader: Trader,
    risk_manager: RiskManager,
    verifier: Verifier,
    observer: Option<StepObserver>,
}

impl TradingGraph {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        data: Arc<dyn MarketData>,
        config: TradingConfig,
    ) -> Self {
        let analysts: Vec<Arc<dyn RoleAgent>> = vec![
            Arc::new(FundamentalAnalyst::new(llm.clone())),
            Arc::new(SentimentAnalyst::new(llm.clone())),
            Arc::new(NewsAnalyst::new(llm.clone())),
            Arc::new(TechnicalAnalyst::new(llm.clone())),
        ];

        Self {
            data,
            config,
            analysts,
            bull: BullResearcher::new(llm.clone()),
            bear: BearResearcher::new(llm.clone()),
            trader: Trader::new(llm.clone()),
            risk_manager: RiskManager::new(llm.clone()),
            verifier: Verifier::new(llm),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: StepObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn emit(&self, step: &StepResult) {
        if let Some(callback) = &self.observer {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| callback(step)));
            if outcome.is_err() {
                warn!(step = %step.step_name, "step observer panicked");
            }
        }
    }

    /// Emit a step event and record it in the stage's patch.
    fn note(&self, patch: &mut StatePatch, step: StepResult) {
        self.emit(&step);
        patch.steps.push(step);
    }

    /// Run the full pipeline for one ticker.
    ///
    /// A data-fetch failure aborts the run; any later stage failure
    /// degrades it. The returned decision is therefore always present
    /// once past the data fetch, even if every agent failed.
    #[instrument(skip(self), fields(ticker = %ticker))]
    pub async fn propagate(
        &self,
        ticker: &str,
        date: Option<&str>,
    ) -> Result<TradingDecision> {
        let analysis_date = date.map_or_else(
            || Utc::now().format("%Y-%m-%d").to_string(),
            ToString::to_string,
        );
        let mut state = PipelineState::new(
            ticker.to_uppercase(),
            analysis_date,
            self.config.risk_tolerance,
            self.config.max_debate_rounds,
            self.config.analysis_period_days,
        );

        // Stage 1 is the sole fatal point: without price data there is
        // nothing to analyze.
        self.emit(&StepResult::pending(STAGE_FETCH_DATA));
        match self.fetch_data(&state).await {
            Ok(patch) => patch.apply(&mut state),
            Err(e) => {
                let step = StepResult::error(STAGE_FETCH_DATA, e.to_string());
                self.emit(&step);
                return Err(e);
            }
        }

        self.emit(&StepResult::pending(STAGE_RUN_ANALYSTS));
        self.run_analysts(&state).await.apply(&mut state);

        self.emit(&StepResult::pending(STAGE_RESEARCH_DEBATE));
        let outcome = self.research_debate(&state).await;
        self.degrade(&mut state, STAGE_RESEARCH_DEBATE, outcome);

        self.emit(&StepResult::pending(STAGE_TRADER_DECISION));
        let outcome = self.trader_decision(&state).await;
        self.degrade(&mut state, STAGE_TRADER_DECISION, outcome);

        self.emit(&StepResult::pending(STAGE_RISK_REVIEW));
        let outcome = self.risk_review(&state).await;
        self.degrade(&mut state, STAGE_RISK_REVIEW, outcome);

        self.emit(&StepResult::pending(STAGE_VERIFICATION));
        let outcome = self.verification(&state).await;
        self.degrade(&mut state, STAGE_VERIFICATION, outcome);

        info!(
            ticker = %state.ticker,
            signal = %state.final_signal,
            confidence = state.final_confidence,
            "pipeline run complete"
        );
        Ok(Self::decision(state))
    }

    /// Merge a stage outcome, converting failure into an error step
    /// plus an empty contribution.
    fn degrade(&self, state: &mut PipelineState, stage: &str, outcome: Result<StatePatch>) {
        match outcome {
            Ok(patch) => patch.apply(state),
            Err(e) => {
                warn!(stage, error = %e, "stage failed, continuing degraded");
                let step = StepResult::error(stage, e.to_string());
                self.emit(&step);
                state.steps.push(step);
            }
        }
    }

    async fn fetch_data(&self, state: &PipelineState) -> Result<StatePatch> {
        // The requested analysis date bounds the price window so a
        // backdated run does not see bars from after that date.
        let end = NaiveDate::parse_from_str(&state.analysis_date, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc());
        let prices = self
            .data
            .price_history(&state.ticker, end, state.period_days)
            .await?;
        let stock_info = self.data.stock_info(&state.ticker).await?;
        let news = self.data.company_news(&state.ticker).await.unwrap_or_default();

        let indicators = compute_indicators(&prices)?;
        let signals = summarize_signals(&indicators);

        let company = stock_info.display_name().to_string();
        let (web_news, web_status) = self.data.web_news(&state.ticker, &company).await;
        let (filings, filing_status) = self.data.filings(&state.ticker).await;
        let trends = self.data.trend_summary(&state.ticker, &company).await;

        let trend_status = match trends.direction {
            TrendDirection::Disabled => SourceStatus::Disabled,
            TrendDirection::NoData | TrendDirection::Error => SourceStatus::NoData,
            _ => SourceStatus::Ok,
        };
        let data_sources = json!({
            "yahoo_finance": {
                "status": SourceStatus::Ok.as_str(),
                "rows": prices.len(),
                "headlines": news.len(),
            },
            "google_news": {
                "status": web_status.as_str(),
                "articles": web_news.len(),
            },
            "sec_edgar": {
                "status": filing_status.as_str(),
                "filings": filings.len(),
            },
            "google_trends": {
                "status": trend_status.as_str(),
                "direction": trends.direction.to_string(),
            },
        });
        let indicator_keys: Vec<&String> = indicators.keys().take(10).collect();

        let mut patch = StatePatch {
            stock_info: Some(stock_info),
            indicators: Some(indicators.clone()),
            signals: Some(signals),
            news: Some(news),
            web_news: Some(web_news),
            filings: Some(filings),
            trends: Some(trends),
            ..StatePatch::default()
        };
        let step = StepResult::completed(STAGE_FETCH_DATA)
            .with_data("data_sources", data_sources)
            .with_data("rows", json!(prices.len()))
            .with_data("indicators_computed", json!(indicator_keys));
        patch.prices = Some(prices);
        self.note(&mut patch, step);
        Ok(patch)
    }

    /// Concurrent analyst fan-out over a bounded worker pool.
    ///
    /// Results are collected in completion order; each analyst's
    /// failure is isolated into a placeholder so the stage always
    /// contributes exactly one report per analyst.
    async fn run_analysts(&self, state: &PipelineState) -> StatePatch {
        let pool = Arc::new(Semaphore::new(self.config.max_parallel_agents.max(1)));
        let mut tasks = JoinSet::new();

        for agent in &self.analysts {
            let agent = agent.clone();
            let snapshot = state.clone();
            let pool = pool.clone();
            tasks.spawn(async move {
                let _permit = pool.acquire_owned().await;
                let outcome = agent.analyze(&snapshot).await;
                (agent.role(), outcome)
            });
        }

        let mut patch = StatePatch::default();
        let mut seen: Vec<AgentRole> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((role, Ok(result))) => {
                    let step = StepResult::completed(role.as_str())
                        .with_data("signal", json!(result.signal))
                        .with_data("confidence", json!(result.confidence));
                    self.note(&mut patch, step);
                    seen.push(role);
                    patch.analyst_reports.push(result);
                }
                Ok((role, Err(e))) => {
                    warn!(role = %role, error = %e, "analyst failed");
                    let step = StepResult::error(role.as_str(), e.to_string());
                    self.note(&mut patch, step);
                    seen.push(role);
                    patch
                        .analyst_reports
                        .push(AnalysisResult::failure(role, &state.ticker, &e.to_string()));
                }
                Err(join_error) => {
                    warn!(error = %join_error, "analyst task panicked");
                }
            }
        }

        // A panicked task loses its role tag; backfill so the stage
        // still contributes one entry per analyst.
        for role in AgentRole::analysts() {
            if !seen.contains(&role) {
                let step = StepResult::error(role.as_str(), "analyst task panicked");
                self.note(&mut patch, step);
                patch.analyst_reports.push(AnalysisResult::failure(
                    role,
                    &state.ticker,
                    "analyst task panicked",
                ));
            }
        }

        let step = StepResult::completed(STAGE_RUN_ANALYSTS)
            .with_data("reports", json!(patch.analyst_reports.len()));
        self.note(&mut patch, step);
        patch
    }

    /// Opening arguments plus bounded rebuttal rounds.
    ///
    /// Each side reads only the other's latest text. The bull/bear
    /// reports keep the signal and confidence derived from the opening
    /// round; later rounds replace only the summary text.
    async fn research_debate(&self, state: &PipelineState) -> Result<StatePatch> {
        let mut bull_report = self.bull.analyze(state).await?;
        let mut bear_report = self.bear.analyze(state).await?;

        let mut bull_text = bull_report.summary.clone();
        let mut bear_text = bear_report.summary.clone();
        let mut rounds = vec![DebateRound {
            round: 1,
            bull: bull_text.clone(),
            bear: bear_text.clone(),
        }];

        for round in 2..=state.max_debate_rounds {
            let next_bull = self.bull.rebut(state, &bear_text).await?;
            let next_bear = self.bear.rebut(state, &bull_text).await?;
            rounds.push(DebateRound {
                round,
                bull: next_bull.clone(),
                bear: next_bear.clone(),
            });
            bull_text = next_bull;
            bear_text = next_bear;
        }

        bull_report.summary = bull_text;
        bear_report.summary = bear_text;

        let mut patch = StatePatch::default();
        let step = StepResult::completed(STAGE_RESEARCH_DEBATE)
            .with_data("rounds", json!(rounds.len()))
            .with_data("bull_signal", json!(bull_report.signal))
            .with_data("bear_signal", json!(bear_report.signal));
        patch.debate_history = rounds;
        patch.analyst_reports = vec![bull_report, bear_report];
        self.note(&mut patch, step);
        Ok(patch)
    }

    async fn trader_decision(&self, state: &PipelineState) -> Result<StatePatch> {
        let result = self.trader.analyze(state).await?;

        let mut patch = StatePatch {
            trader_summary: Some(result.summary.clone()),
            trader_signal: Some(result.signal),
            trader_confidence: Some(result.confidence),
            final_signal: Some(result.signal),
            final_confidence: Some(result.confidence),
            ..StatePatch::default()
        };
        let step = StepResult::completed(STAGE_TRADER_DECISION)
            .with_data("signal", json!(result.signal))
            .with_data("confidence", json!(result.confidence))
            .with_data(
                "inputs_used",
                result
                    .details
                    .get("inputs_used")
                    .cloned()
                    .unwrap_or(Value::Null),
            );
        self.note(&mut patch, step);
        Ok(patch)
    }

    async fn risk_review(&self, state: &PipelineState) -> Result<StatePatch> {
        let result = self.risk_manager.analyze(state).await?;
        let before = state.final_confidence;
        let (signal, confidence) =
            apply_risk_verdict(state.final_signal, before, result.signal);

        let mut patch = StatePatch {
            final_signal: Some(signal),
            final_confidence: Some(confidence),
            risk_assessment: Some(result.summary.clone()),
            ..StatePatch::default()
        };
        let step = StepResult::completed(STAGE_RISK_REVIEW)
            .with_data("verdict", json!(result.signal))
            .with_data("confidence_before", json!(before))
            .with_data("confidence_after", json!(confidence));
        self.note(&mut patch, step);
        Ok(patch)
    }

    async fn verification(&self, state: &PipelineState) -> Result<StatePatch> {
        let result = self.verifier.analyze(state).await?;

        let adjustment = result
            .details
            .get("confidence_adjustment")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let issues: Vec<String> = result
            .details
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

        let mut patch = StatePatch {
            verification_summary: Some(result.summary.clone()),
            verification_issues: Some(issues.clone()),
            ..StatePatch::default()
        };
        if adjustment != 0 {
            patch.final_confidence =
                Some(apply_verification(state.final_confidence, adjustment));
        }
        let step = StepResult::completed(STAGE_VERIFICATION)
            .with_data("verdict", json!(result.signal))
            .with_data("confidence_adjustment", json!(adjustment))
            .with_data(
                "issues",
                json!(issues.iter().take(5).collect::<Vec<_>>()),
            );
        self.note(&mut patch, step);
        Ok(patch)
    }

    /// Freeze the final state into an immutable decision snapshot.
    fn decision(state: PipelineState) -> TradingDecision {
        let stock_info: HashMap<String, Value> =
            match serde_json::to_value(&state.stock_info) {
                Ok(Value::Object(map)) => map.into_iter().collect(),
                _ => HashMap::new(),
            };

        // The 50.0 in the state is a mid-pipeline working default. If
        // no scoring stage ever completed it was never earned, and the
        // decision reports zero confidence instead.
        let scored = state.steps.iter().any(|step| {
            step.status == StepStatus::Completed
                && (step.step_name == STAGE_TRADER_DECISION
                    || step.step_name == STAGE_RISK_REVIEW
                    || step.step_name == STAGE_VERIFICATION)
        });
        let final_confidence = if scored { state.final_confidence } else { 0.0 };

        TradingDecision {
            ticker: state.ticker,
            analysis_date: state.analysis_date,
            final_signal: state.final_signal,
            final_confidence,
            trader_summary: state.trader_summary,
            risk_assessment: state.risk_assessment,
            verification_summary: state.verification_summary,
            verification_issues: state.verification_issues,
            analyst_reports: state.analyst_reports,
            debate_history: state.debate_history,
            steps: state.steps,
            stock_info,
            indicators: state.indicators.into_iter().collect(),
            signals: state.signals.entries.into_iter().collect(),
            price_rows: state.prices.len(),
            generated_at: Utc::now(),
        }
    }
}

/// The risk-review policy. Multipliers and floors are contractual
/// values, not tunables.
pub(crate) fn apply_risk_verdict(
    signal: Signal,
    confidence: f64,
    verdict: Signal,
) -> (Signal, f64) {
    match verdict {
        Signal::Reject => (Signal::Hold, (confidence * 0.5).max(20.0)),
        Signal::Modify => (signal, (confidence * 0.75).max(30.0)),
        _ => (signal, confidence),
    }
}

/// Verification adjustment with a floor of 10. Only called for a
/// non-zero adjustment.
pub(crate) fn apply_verification(confidence: f64, adjustment: i64) -> f64 {
    (confidence + adjustment as f64).max(10.0)
}
