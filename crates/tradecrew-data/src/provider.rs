//! The data collaborator trait and its production implementation

use crate::edgar::EdgarClient;
use crate::error::Result;
use crate::trends::TrendsClient;
use crate::types::{Filing, NewsItem, PriceBar, StockInfo, TrendDirection, TrendSummary};
use crate::webnews::GoogleNewsClient;
use crate::yahoo::YahooClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome tag for the independently enablable secondary sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Disabled,
    NoData,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Disabled => "disabled",
            Self::NoData => "no_data",
        }
    }
}

/// Enable flags and tuning for the secondary data sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub enable_web_news: bool,
    pub enable_filings: bool,
    pub enable_trends: bool,
    pub web_news_max_results: usize,
    pub max_filings: usize,
    pub trends_timeframe: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enable_web_news: true,
            enable_filings: true,
            enable_trends: true,
            web_news_max_results: 10,
            max_filings: 5,
            trends_timeframe: "today 3-m".to_string(),
        }
    }
}

/// Everything the pipeline needs from the market-data side.
///
/// The first three operations raise on failure; the remaining three
/// cover the optional sources and always resolve, tagging the outcome
/// instead of raising.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Daily OHLCV history ending at `end`, spanning `days`.
    async fn price_history(
        &self,
        ticker: &str,
        end: Option<DateTime<Utc>>,
        days: u32,
    ) -> Result<Vec<PriceBar>>;

    /// Company fundamentals, fields individually nullable.
    async fn stock_info(&self, ticker: &str) -> Result<StockInfo>;

    /// Recent company headlines. May be empty.
    async fn company_news(&self, ticker: &str) -> Result<Vec<NewsItem>>;

    /// Broader web headlines for `"<company> stock"`.
    async fn web_news(&self, ticker: &str, company: &str) -> (Vec<NewsItem>, SourceStatus);

    /// Recent periodic and event filings.
    async fn filings(&self, ticker: &str) -> (Vec<Filing>, SourceStatus);

    /// Search-interest summary for `"<company> stock"`.
    async fn trend_summary(&self, ticker: &str, company: &str) -> TrendSummary;
}

/// Production implementation backed by Yahoo, EDGAR, Google News, and
/// Google Trends.
pub struct MarketDataProvider {
    yahoo: YahooClient,
    edgar: Option<EdgarClient>,
    news: Option<GoogleNewsClient>,
    trends: Option<TrendsClient>,
    max_filings: usize,
}

impl MarketDataProvider {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            yahoo: YahooClient::new()?,
            edgar: if config.enable_filings {
                Some(EdgarClient::new()?)
            } else {
                None
            },
            news: if config.enable_web_news {
                Some(GoogleNewsClient::new(config.web_news_max_results)?)
            } else {
                None
            },
            trends: if config.enable_trends {
                Some(TrendsClient::new(config.trends_timeframe.clone())?)
            } else {
                None
            },
            max_filings: config.max_filings,
        })
    }

    fn keyword(ticker: &str, company: &str) -> String {
        let subject = if company.is_empty() { ticker } else { company };
        format!("{subject} stock")
    }
}

#[async_trait]
impl MarketData for MarketDataProvider {
    async fn price_history(
        &self,
        ticker: &str,
        end: Option<DateTime<Utc>>,
        days: u32,
    ) -> Result<Vec<PriceBar>> {
        self.yahoo.price_history(ticker, end, days).await
    }

    async fn stock_info(&self, ticker: &str) -> Result<StockInfo> {
        Ok(self.yahoo.stock_info(ticker).await)
    }

    async fn company_news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        self.yahoo.company_news(ticker).await
    }

    async fn web_news(&self, ticker: &str, company: &str) -> (Vec<NewsItem>, SourceStatus) {
        let Some(client) = &self.news else {
            return (Vec::new(), SourceStatus::Disabled);
        };
        match client.search(&Self::keyword(ticker, company)).await {
            Ok(items) if items.is_empty() => (items, SourceStatus::NoData),
            Ok(items) => (items, SourceStatus::Ok),
            Err(e) => {
                debug!(ticker, error = %e, "web news fetch failed");
                (Vec::new(), SourceStatus::NoData)
            }
        }
    }

    async fn filings(&self, ticker: &str) -> (Vec<Filing>, SourceStatus) {
        let Some(client) = &self.edgar else {
            return (Vec::new(), SourceStatus::Disabled);
        };
        match client.recent_filings(ticker, self.max_filings).await {
            Ok(filings) if filings.is_empty() => (filings, SourceStatus::NoData),
            Ok(filings) => (filings, SourceStatus::Ok),
            Err(e) => {
                debug!(ticker, error = %e, "filings fetch failed");
                (Vec::new(), SourceStatus::NoData)
            }
        }
    }

    async fn trend_summary(&self, ticker: &str, company: &str) -> TrendSummary {
        let keyword = Self::keyword(ticker, company);
        let Some(client) = &self.trends else {
            return TrendSummary::unavailable(keyword, TrendDirection::Disabled);
        };
        client.interest(&keyword).await
    }
}
