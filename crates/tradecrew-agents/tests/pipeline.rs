//! End-to-end pipeline runs against scripted LLM and market-data mocks

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tradecrew_agents::{PipelineError, StepObserver, TradingConfig, TradingGraph};
use tradecrew_core::{AgentRole, Signal, StepStatus};
use tradecrew_data::{
    DataError, Filing, MarketData, NewsItem, PriceBar, SourceStatus, StockInfo, TrendDirection,
    TrendSummary,
};
use tradecrew_llm::{LlmClient, LlmError};

/// Scripted LLM: bullish free text for analysts, researchers, and the
/// trader; a neutral review verdict; a non-committal verification.
struct ScriptedLlm;

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, _prompt: &str, system_prompt: &str) -> tradecrew_llm::Result<String> {
        if system_prompt.contains("risk manager") {
            Ok("Needs a second look from the committee.".to_string())
        } else if system_prompt.contains("verification agent") {
            Ok("Hard to say either way.".to_string())
        } else {
            Ok("The outlook is clearly bullish, I would buy.".to_string())
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Like `ScriptedLlm` but numbers each generic reply, so successive
/// debate rounds produce distinct text.
struct CountingLlm {
    calls: AtomicU32,
}

#[async_trait]
impl LlmClient for CountingLlm {
    async fn generate(&self, _prompt: &str, system_prompt: &str) -> tradecrew_llm::Result<String> {
        if system_prompt.contains("risk manager") {
            Ok("Needs a second look from the committee.".to_string())
        } else if system_prompt.contains("verification agent") {
            Ok("Hard to say either way.".to_string())
        } else {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("Take {n}: clearly bullish, I would buy."))
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// LLM that fails every call with a non-retryable error.
struct BrokenLlm;

#[async_trait]
impl LlmClient for BrokenLlm {
    async fn generate(&self, _prompt: &str, _system_prompt: &str) -> tradecrew_llm::Result<String> {
        Err(LlmError::Configuration("no backend".to_string()))
    }

    async fn is_available(&self) -> bool {
        false
    }
}

fn synthetic_prices(rows: usize) -> Vec<PriceBar> {
    let start: DateTime<Utc> = Utc::now() - Duration::days(rows as i64);
    (0..rows)
        .map(|i| {
            let close = 100.0 + i as f64;
            PriceBar {
                date: start + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000 + (i as u64) * 10_000,
            }
        })
        .collect()
}

struct FakeMarketData;

#[async_trait]
impl MarketData for FakeMarketData {
    async fn price_history(
        &self,
        _ticker: &str,
        _end: Option<DateTime<Utc>>,
        _days: u32,
    ) -> tradecrew_data::Result<Vec<PriceBar>> {
        Ok(synthetic_prices(30))
    }

    async fn stock_info(&self, ticker: &str) -> tradecrew_data::Result<StockInfo> {
        Ok(StockInfo {
            name: Some("Test Corp".to_string()),
            ..StockInfo::minimal(ticker)
        })
    }

    async fn company_news(&self, _ticker: &str) -> tradecrew_data::Result<Vec<NewsItem>> {
        Ok(vec![NewsItem {
            title: "Test Corp beats estimates".to_string(),
            publisher: Some("Newswire".to_string()),
            summary: None,
            url: None,
            published_at: None,
        }])
    }

    async fn web_news(&self, _ticker: &str, _company: &str) -> (Vec<NewsItem>, SourceStatus) {
        (Vec::new(), SourceStatus::Disabled)
    }

    async fn filings(&self, _ticker: &str) -> (Vec<Filing>, SourceStatus) {
        (Vec::new(), SourceStatus::Disabled)
    }

    async fn trend_summary(&self, _ticker: &str, company: &str) -> TrendSummary {
        TrendSummary::unavailable(format!("{company} stock"), TrendDirection::Disabled)
    }
}

/// Records the end bound passed to `price_history`, delegating the
/// rest to `FakeMarketData`.
struct CapturingMarketData {
    end_seen: Arc<Mutex<Option<Option<DateTime<Utc>>>>>,
}

#[async_trait]
impl MarketData for CapturingMarketData {
    async fn price_history(
        &self,
        ticker: &str,
        end: Option<DateTime<Utc>>,
        days: u32,
    ) -> tradecrew_data::Result<Vec<PriceBar>> {
        *self.end_seen.lock().unwrap() = Some(end);
        FakeMarketData.price_history(ticker, end, days).await
    }

    async fn stock_info(&self, ticker: &str) -> tradecrew_data::Result<StockInfo> {
        FakeMarketData.stock_info(ticker).await
    }

    async fn company_news(&self, ticker: &str) -> tradecrew_data::Result<Vec<NewsItem>> {
        FakeMarketData.company_news(ticker).await
    }

    async fn web_news(&self, ticker: &str, company: &str) -> (Vec<NewsItem>, SourceStatus) {
        FakeMarketData.web_news(ticker, company).await
    }

    async fn filings(&self, ticker: &str) -> (Vec<Filing>, SourceStatus) {
        FakeMarketData.filings(ticker).await
    }

    async fn trend_summary(&self, ticker: &str, company: &str) -> TrendSummary {
        FakeMarketData.trend_summary(ticker, company).await
    }
}

struct EmptyMarketData;

#[async_trait]
impl MarketData for EmptyMarketData {
    async fn price_history(
        &self,
        ticker: &str,
        _end: Option<DateTime<Utc>>,
        _days: u32,
    ) -> tradecrew_data::Result<Vec<PriceBar>> {
        Err(DataError::NotFound(ticker.to_string()))
    }

    async fn stock_info(&self, ticker: &str) -> tradecrew_data::Result<StockInfo> {
        Ok(StockInfo::minimal(ticker))
    }

    async fn company_news(&self, _ticker: &str) -> tradecrew_data::Result<Vec<NewsItem>> {
        Ok(Vec::new())
    }

    async fn web_news(&self, _ticker: &str, _company: &str) -> (Vec<NewsItem>, SourceStatus) {
        (Vec::new(), SourceStatus::Disabled)
    }

    async fn filings(&self, _ticker: &str) -> (Vec<Filing>, SourceStatus) {
        (Vec::new(), SourceStatus::Disabled)
    }

    async fn trend_summary(&self, _ticker: &str, company: &str) -> TrendSummary {
        TrendSummary::unavailable(format!("{company} stock"), TrendDirection::Disabled)
    }
}

fn graph(llm: Arc<dyn LlmClient>, data: Arc<dyn MarketData>) -> TradingGraph {
    TradingGraph::new(llm, data, TradingConfig::default())
}

#[tokio::test]
async fn test_full_run_produces_decision() {
    let graph = graph(Arc::new(ScriptedLlm), Arc::new(FakeMarketData));
    let decision = graph.propagate("aapl", Some("2025-08-01")).await.unwrap();

    assert_eq!(decision.ticker, "AAPL");
    assert_eq!(decision.analysis_date, "2025-08-01");
    // Bullish free text parses to buy at 70; review leaves it alone
    assert_eq!(decision.final_signal, Signal::Buy);
    assert!((decision.final_confidence - 70.0).abs() < f64::EPSILON);
    // Four analysts plus the bull and bear researchers
    assert_eq!(decision.analyst_reports.len(), 6);
    assert_eq!(
        decision.debate_history.len(),
        TradingConfig::default().max_debate_rounds as usize
    );
    assert_eq!(decision.price_rows, 30);
    assert!(!decision.indicators.is_empty());

    for stage in [
        "fetch_data",
        "run_analysts",
        "research_debate",
        "trader_decision",
        "risk_review",
        "verification",
    ] {
        assert!(
            decision
                .steps
                .iter()
                .any(|s| s.step_name == stage && s.status == StepStatus::Completed),
            "missing completed step for {stage}"
        );
    }
}

#[tokio::test]
async fn test_three_round_debate_keeps_opening_signal() {
    let config = TradingConfig {
        max_debate_rounds: 3,
        ..TradingConfig::default()
    };
    let graph = TradingGraph::new(
        Arc::new(CountingLlm {
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeMarketData),
        config,
    );
    let decision = graph.propagate("AAPL", None).await.unwrap();

    assert_eq!(decision.debate_history.len(), 3);
    // Each round carries fresh text
    assert_ne!(decision.debate_history[0].bull, decision.debate_history[2].bull);

    let bull = decision
        .analyst_reports
        .iter()
        .find(|r| r.agent_role == AgentRole::BullResearcher)
        .unwrap();
    // Summary comes from the final round; signal and confidence stay
    // as parsed in the opening round
    assert_eq!(bull.summary, decision.debate_history[2].bull);
    assert_eq!(bull.signal, Signal::Buy);
    assert!((bull.confidence - 70.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_analysis_date_bounds_price_window() {
    let end_seen = Arc::new(Mutex::new(None));
    let data = CapturingMarketData {
        end_seen: end_seen.clone(),
    };
    let graph = graph(Arc::new(ScriptedLlm), Arc::new(data));
    graph.propagate("AAPL", Some("2025-06-30")).await.unwrap();

    let end = end_seen.lock().unwrap().expect("price_history not called");
    let end = end.expect("no end bound passed");
    assert_eq!(end.format("%Y-%m-%d").to_string(), "2025-06-30");
}

#[tokio::test]
async fn test_default_date_leaves_price_window_open() {
    let end_seen = Arc::new(Mutex::new(None));
    let data = CapturingMarketData {
        end_seen: end_seen.clone(),
    };
    let graph = graph(Arc::new(ScriptedLlm), Arc::new(data));
    graph.propagate("AAPL", None).await.unwrap();

    // Today's date still parses, so a bound is always present
    let end = end_seen.lock().unwrap().expect("price_history not called");
    assert!(end.is_some());
}

#[tokio::test]
async fn test_missing_price_data_is_fatal() {
    let graph = graph(Arc::new(ScriptedLlm), Arc::new(EmptyMarketData));
    let err = graph.propagate("AAPL", None).await.unwrap_err();
    assert!(matches!(err, PipelineError::DataFetch(_)));
}

#[tokio::test]
async fn test_broken_llm_degrades_but_completes() {
    let graph = graph(Arc::new(BrokenLlm), Arc::new(FakeMarketData));
    let decision = graph.propagate("AAPL", None).await.unwrap();

    // One failure placeholder per analyst, nothing from the debate
    assert_eq!(decision.analyst_reports.len(), 4);
    assert!(decision.analyst_reports.iter().all(|r| r.is_failure()));
    assert!(decision.debate_history.is_empty());

    // No scoring stage ever completed, so the decision reports zero
    // confidence rather than the mid-pipeline working default
    assert_eq!(decision.final_signal, Signal::Hold);
    assert!(decision.final_confidence.abs() < f64::EPSILON);

    let errors = decision
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Error)
        .count();
    assert!(errors >= 4, "expected error steps, got {errors}");
}

#[tokio::test]
async fn test_observer_sees_pending_and_completed_events() {
    let events: Arc<Mutex<Vec<(String, StepStatus)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let observer: StepObserver = Arc::new(move |step| {
        sink.lock()
            .unwrap()
            .push((step.step_name.clone(), step.status));
    });

    let graph = TradingGraph::new(
        Arc::new(ScriptedLlm),
        Arc::new(FakeMarketData),
        TradingConfig::default(),
    )
    .with_observer(observer);
    graph.propagate("AAPL", None).await.unwrap();

    let events = events.lock().unwrap();
    let pending = |name: &str| {
        events
            .iter()
            .any(|(n, s)| n == name && *s == StepStatus::Pending)
    };
    let completed = |name: &str| {
        events
            .iter()
            .any(|(n, s)| n == name && *s == StepStatus::Completed)
    };

    for stage in [
        "fetch_data",
        "run_analysts",
        "research_debate",
        "trader_decision",
        "risk_review",
        "verification",
    ] {
        assert!(pending(stage), "no pending event for {stage}");
        assert!(completed(stage), "no completed event for {stage}");
    }
    // Per-analyst events arrive under the analyst's role name
    assert!(completed("technical_analyst"));
    assert!(completed("fundamental_analyst"));
}

#[tokio::test]
async fn test_panicking_observer_does_not_break_the_run() {
    let observer: StepObserver = Arc::new(|_step| panic!("observer bug"));
    let graph = TradingGraph::new(
        Arc::new(ScriptedLlm),
        Arc::new(FakeMarketData),
        TradingConfig::default(),
    )
    .with_observer(observer);

    let decision = graph.propagate("AAPL", None).await.unwrap();
    assert_eq!(decision.final_signal, Signal::Buy);
}
