//! End-to-end screener runs against scripted LLM and market-data mocks

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tradecrew_agents::{Screener, TradingConfig};
use tradecrew_core::Signal;
use tradecrew_data::{
    DataError, Filing, MarketData, NewsItem, PriceBar, SourceStatus, StockInfo, TrendDirection,
    TrendSummary,
};
use tradecrew_llm::LlmClient;

/// Replies with a fixed JSON ranking regardless of the prompt.
struct RankingLlm;

#[async_trait]
impl LlmClient for RankingLlm {
    async fn generate(&self, _prompt: &str, _system_prompt: &str) -> tradecrew_llm::Result<String> {
        Ok(r#"{"picks": [
            {"ticker": "AAPL", "signal": "hold", "confidence": 55,
             "rationale": "Fairly valued.", "time_horizon": "6 months", "risks": []},
            {"ticker": "NVDA", "signal": "strong_buy", "confidence": 88,
             "rationale": "Momentum and earnings.", "time_horizon": "3 months",
             "risks": ["valuation"]},
            {"ticker": "MSFT", "signal": "buy", "confidence": 70,
             "rationale": "Cloud growth.", "time_horizon": "12 months", "risks": []}
        ]}"#
        .to_string())
    }

    async fn is_available(&self) -> bool {
        true
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
                volume: 1_000_000,
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

struct FailingMarketData;

#[async_trait]
impl MarketData for FailingMarketData {
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

#[tokio::test]
async fn test_screen_ranks_and_truncates() {
    let screener = Screener::new(
        Arc::new(RankingLlm),
        Arc::new(FakeMarketData),
        TradingConfig::default(),
    );
    let result = screener.screen("aapl, nvda msft", 2).await.unwrap();

    assert_eq!(result.watchlist, vec!["AAPL", "NVDA", "MSFT"]);
    assert!(result.errors.is_empty());

    // The LLM's ordering is re-sorted by confidence and cut to top_n
    assert_eq!(result.picks.len(), 2);
    assert_eq!(result.picks[0].ticker, "NVDA");
    assert_eq!(result.picks[0].signal, Signal::StrongBuy);
    assert_eq!(result.picks[1].ticker, "MSFT");
    for (i, pick) in result.picks.iter().enumerate() {
        assert_eq!(pick.rank, i + 1);
    }
    assert!(result.picks[0].confidence >= result.picks[1].confidence);
}

#[tokio::test]
async fn test_screen_with_no_fetchable_data_reports_aggregate_error() {
    let screener = Screener::new(
        Arc::new(RankingLlm),
        Arc::new(FailingMarketData),
        TradingConfig::default(),
    );
    let result = screener.screen("AAPL, MSFT", 5).await.unwrap();

    assert!(result.picks.is_empty());
    // One error per ticker plus the aggregate marker
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors.iter().any(|e| e.starts_with("AAPL:")));
    assert_eq!(
        result.errors.last().map(String::as_str),
        Some("No valid ticker data available")
    );
}
