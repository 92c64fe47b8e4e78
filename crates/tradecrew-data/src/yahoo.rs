//! Yahoo Finance client
//!
//! Price history via the `yahoo_finance_api` connector, company news
//! via its search endpoint, and fundamentals via the public
//! quoteSummary JSON endpoint.

use crate::error::{DataError, Result};
use crate::types::{NewsItem, PriceBar, StockInfo};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const QUOTE_SUMMARY_MODULES: &str =
    "assetProfile,summaryDetail,defaultKeyStatistics,financialData,price";
const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct YahooClient {
    http: Client,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (compatible; tradecrew/0.1)")
            .build()?;
        Ok(Self { http })
    }

    /// Fetch daily price history ending at `end` and spanning `days`.
    pub async fn price_history(
        &self,
        ticker: &str,
        end: Option<DateTime<Utc>>,
        days: u32,
    ) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| DataError::Fetch(format!("yahoo connector: {e}")))?;

        let end = end.unwrap_or_else(Utc::now);
        let start = end - Duration::days(i64::from(days));

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::Fetch(format!("invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::Fetch(format!("invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(ticker, start_odt, end_odt)
            .await
            .map_err(|e| DataError::Fetch(format!("yahoo history for {ticker}: {e}")))?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::Fetch(format!("yahoo quotes for {ticker}: {e}")))?;

        if quotes.is_empty() {
            return Err(DataError::NotFound(ticker.to_string()));
        }

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                date: DateTime::from_timestamp(q.timestamp as i64, 0).unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }

    /// Fetch company fundamentals. Degrades to a minimal record when
    /// the quoteSummary endpoint is unreachable or reshaped.
    pub async fn stock_info(&self, ticker: &str) -> StockInfo {
        match self.fetch_quote_summary(ticker).await {
            Ok(info) => info,
            Err(e) => {
                debug!(ticker, error = %e, "quoteSummary fetch failed, using minimal info");
                StockInfo::minimal(ticker)
            }
        }
    }

    async fn fetch_quote_summary(&self, ticker: &str) -> Result<StockInfo> {
        let url = format!("{QUOTE_SUMMARY_URL}/{ticker}?modules={QUOTE_SUMMARY_MODULES}");
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(DataError::Fetch(format!(
                "quoteSummary HTTP {} for {ticker}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DataError::UnexpectedResponse(e.to_string()))?;

        let result = body
            .pointer("/quoteSummary/result/0")
            .ok_or_else(|| DataError::UnexpectedResponse("missing quoteSummary result".into()))?;

        let raw = |path: &str| result.pointer(path).and_then(serde_json::Value::as_f64);
        let text = |path: &str| {
            result
                .pointer(path)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        Ok(StockInfo {
            ticker: ticker.to_string(),
            name: text("/price/longName").or_else(|| text("/price/shortName")),
            sector: text("/assetProfile/sector"),
            industry: text("/assetProfile/industry"),
            market_cap: raw("/summaryDetail/marketCap/raw"),
            pe_ratio: raw("/summaryDetail/trailingPE/raw"),
            forward_pe: raw("/summaryDetail/forwardPE/raw"),
            price_to_book: raw("/defaultKeyStatistics/priceToBook/raw"),
            profit_margin: raw("/financialData/profitMargins/raw"),
            revenue_growth: raw("/financialData/revenueGrowth/raw"),
            dividend_yield: raw("/summaryDetail/dividendYield/raw"),
            beta: raw("/summaryDetail/beta/raw"),
            week_52_high: raw("/summaryDetail/fiftyTwoWeekHigh/raw"),
            week_52_low: raw("/summaryDetail/fiftyTwoWeekLow/raw"),
            avg_volume: raw("/summaryDetail/averageVolume/raw"),
            debt_to_equity: raw("/financialData/debtToEquity/raw"),
            return_on_equity: raw("/financialData/returnOnEquity/raw"),
            free_cash_flow: raw("/financialData/freeCashflow/raw"),
            current_price: raw("/financialData/currentPrice/raw"),
        })
    }

    /// Fetch recent company news headlines. May return an empty list.
    pub async fn company_news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| DataError::Fetch(format!("yahoo connector: {e}")))?;

        let result = provider
            .search_ticker(ticker)
            .await
            .map_err(|e| DataError::Fetch(format!("yahoo news for {ticker}: {e}")))?;

        Ok(result
            .news
            .into_iter()
            .map(|item| NewsItem {
                title: item.title,
                publisher: Some(item.publisher),
                summary: None,
                url: Some(item.link),
                published_at: DateTime::from_timestamp(item.provider_publish_time as i64, 0),
            })
            .collect())
    }
}
