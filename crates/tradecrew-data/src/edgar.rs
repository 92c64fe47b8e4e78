//! SEC EDGAR filings client
//!
//! Looks up a ticker's CIK from the public company index, then pulls
//! the recent-filings feed and keeps periodic and event forms. EDGAR
//! asks for a descriptive User-Agent and fair-access pacing, hence the
//! rate limiter.

use crate::error::{DataError, Result};
use crate::types::Filing;
use chrono::NaiveDate;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use tokio::sync::OnceCell;
use tracing::debug;

const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const SUBMISSIONS_URL: &str = "https://data.sec.gov/submissions";
const ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";
const USER_AGENT: &str = "tradecrew research agent (contact@tradecrew.local)";
const REQUEST_TIMEOUT_SECS: u64 = 15;
const REQUESTS_PER_SECOND: u32 = 5;

const DEFAULT_FORMS: [&str; 3] = ["10-K", "10-Q", "8-K"];

pub struct EdgarClient {
    http: Client,
    limiter: DefaultDirectRateLimiter,
    /// CIK index is large and static per process, fetch it once.
    cik_index: OnceCell<serde_json::Value>,
}

impl EdgarClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        let quota = Quota::per_second(
            NonZeroU32::new(REQUESTS_PER_SECOND)
                .ok_or_else(|| DataError::Fetch("invalid rate limit".into()))?,
        );

        Ok(Self {
            http,
            limiter: RateLimiter::direct(quota),
            cik_index: OnceCell::new(),
        })
    }

    /// Recent filings for a ticker, newest first, limited to `max`.
    pub async fn recent_filings(&self, ticker: &str, max: usize) -> Result<Vec<Filing>> {
        let cik = self.lookup_cik(ticker).await?;

        self.limiter.until_ready().await;
        let url = format!("{SUBMISSIONS_URL}/CIK{cik}.json");
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(DataError::Fetch(format!(
                "EDGAR submissions HTTP {} for {ticker}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DataError::UnexpectedResponse(e.to_string()))?;

        let recent = body
            .pointer("/filings/recent")
            .ok_or_else(|| DataError::UnexpectedResponse("missing recent filings".into()))?;

        let forms = string_column(recent, "form");
        let dates = string_column(recent, "filingDate");
        let accessions = string_column(recent, "accessionNumber");
        let documents = string_column(recent, "primaryDocument");
        let descriptions = string_column(recent, "primaryDocDescription");

        let mut filings = Vec::new();
        for i in 0..forms.len() {
            let form = forms[i];
            if !DEFAULT_FORMS.contains(&form) {
                continue;
            }
            let Some(filing_date) =
                dates.get(i).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let accession = accessions.get(i).copied().unwrap_or_default();
            let document = documents.get(i).copied().unwrap_or_default();
            let url = format!(
                "{ARCHIVES_URL}/{cik_short}/{accession_stripped}/{document}",
                cik_short = cik.trim_start_matches('0'),
                accession_stripped = accession.replace('-', ""),
            );

            filings.push(Filing {
                form: form.to_string(),
                filing_date,
                description: descriptions
                    .get(i)
                    .filter(|d| !d.is_empty())
                    .map_or_else(|| form.to_string(), |d| (*d).to_string()),
                url,
            });
            if filings.len() >= max {
                break;
            }
        }

        debug!(ticker, count = filings.len(), "fetched EDGAR filings");
        Ok(filings)
    }

    /// Resolve a ticker to its zero-padded 10-digit CIK.
    async fn lookup_cik(&self, ticker: &str) -> Result<String> {
        let index = self
            .cik_index
            .get_or_try_init(|| self.fetch_cik_index())
            .await?;

        let upper = ticker.to_uppercase();
        let entries = index
            .as_object()
            .ok_or_else(|| DataError::UnexpectedResponse("malformed CIK index".into()))?;

        for entry in entries.values() {
            let matches = entry
                .get("ticker")
                .and_then(serde_json::Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case(&upper));
            if matches {
                let cik = entry
                    .get("cik_str")
                    .and_then(serde_json::Value::as_u64)
                    .ok_or_else(|| DataError::UnexpectedResponse("missing cik_str".into()))?;
                return Ok(format!("{cik:010}"));
            }
        }

        Err(DataError::NotFound(format!("no CIK for ticker {ticker}")))
    }

    async fn fetch_cik_index(&self) -> Result<serde_json::Value> {
        self.limiter.until_ready().await;
        let response = self.http.get(COMPANY_TICKERS_URL).send().await?;
        if !response.status().is_success() {
            return Err(DataError::Fetch(format!(
                "EDGAR ticker index HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| DataError::UnexpectedResponse(e.to_string()))
    }
}

fn string_column<'a>(recent: &'a serde_json::Value, key: &str) -> Vec<&'a str> {
    recent
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|v| v.as_str().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_column_extraction() {
        let recent = json!({
            "form": ["10-K", "8-K"],
            "filingDate": ["2025-01-30", "2025-02-14"],
        });
        assert_eq!(string_column(&recent, "form"), vec!["10-K", "8-K"]);
        assert!(string_column(&recent, "missing").is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_recent_filings_for_apple() {
        let client = EdgarClient::new().unwrap();
        let filings = client.recent_filings("AAPL", 5).await.unwrap();
        assert!(!filings.is_empty());
        assert!(filings.len() <= 5);
        assert!(DEFAULT_FORMS.contains(&filings[0].form.as_str()));
    }
}
