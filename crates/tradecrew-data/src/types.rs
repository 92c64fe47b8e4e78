//! Market data record types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One daily OHLCV row of a price series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Company fundamentals, fields individually nullable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockInfo {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub avg_volume: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub current_price: Option<f64>,
}

impl StockInfo {
    pub fn minimal(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    /// Company name, falling back to the ticker symbol.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.ticker)
    }
}

/// A news headline from any of the news sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// One SEC EDGAR filing reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filing {
    /// Form type, e.g. "10-K", "10-Q", "8-K"
    pub form: String,
    pub filing_date: NaiveDate,
    pub description: String,
    pub url: String,
}

/// Direction of search interest over the sampled window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Declining,
    Stable,
    NoData,
    Error,
    Disabled,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rising => "rising",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::NoData => "no_data",
            Self::Error => "error",
            Self::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Search-interest summary for a keyword, scores on a 0-100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSummary {
    pub keyword: String,
    pub average_interest: f64,
    pub current_interest: f64,
    pub direction: TrendDirection,
}

impl TrendSummary {
    /// Neutral placeholder used whenever the source cannot answer.
    pub fn unavailable(keyword: impl Into<String>, direction: TrendDirection) -> Self {
        Self {
            keyword: keyword.into(),
            average_interest: 0.0,
            current_interest: 0.0,
            direction,
        }
    }
}
