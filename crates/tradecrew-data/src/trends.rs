//! Google Trends client
//!
//! Search-interest scores for a keyword. The API is unofficial and
//! token-gated: an explore call yields a per-widget token, then the
//! multiline widget endpoint yields the time series. Any failure along
//! the way degrades to a neutral summary, never an error.

use crate::error::{DataError, Result};
use crate::types::{TrendDirection, TrendSummary};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

const EXPLORE_URL: &str = "https://trends.google.com/trends/api/explore";
const WIDGET_URL: &str = "https://trends.google.com/trends/api/widgetdata/multiline";
const REQUEST_TIMEOUT_SECS: u64 = 10;

const RISING_THRESHOLD: f64 = 1.15;
const DECLINING_THRESHOLD: f64 = 0.85;

pub struct TrendsClient {
    http: Client,
    timeframe: String,
}

impl TrendsClient {
    pub fn new(timeframe: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (compatible; tradecrew/0.1)")
            .build()?;
        Ok(Self {
            http,
            timeframe: timeframe.into(),
        })
    }

    /// Interest summary for a keyword over the configured timeframe.
    ///
    /// Never raises: unreachable or reshaped endpoints yield a summary
    /// tagged `error`, an empty series yields `no_data`.
    pub async fn interest(&self, keyword: &str) -> TrendSummary {
        match self.fetch_series(keyword).await {
            Ok(values) if values.is_empty() => {
                TrendSummary::unavailable(keyword, TrendDirection::NoData)
            }
            Ok(values) => summarize_series(keyword, &values),
            Err(e) => {
                debug!(keyword, error = %e, "trends fetch failed");
                TrendSummary::unavailable(keyword, TrendDirection::Error)
            }
        }
    }

    async fn fetch_series(&self, keyword: &str) -> Result<Vec<f64>> {
        let explore_req = json!({
            "comparisonItem": [{"keyword": keyword, "geo": "", "time": self.timeframe}],
            "category": 0,
            "property": "",
        });
        let explore_body = self
            .get_api(EXPLORE_URL, &[("req", &explore_req.to_string())])
            .await?;
        let explore: serde_json::Value = serde_json::from_str(strip_prefix(&explore_body))
            .map_err(|e| DataError::UnexpectedResponse(format!("explore payload: {e}")))?;

        let widgets = explore
            .pointer("/widgets")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| DataError::UnexpectedResponse("missing widgets".into()))?;
        let timeseries = widgets
            .iter()
            .find(|w| w.get("id").and_then(serde_json::Value::as_str) == Some("TIMESERIES"))
            .ok_or_else(|| DataError::UnexpectedResponse("no timeseries widget".into()))?;

        let token = timeseries
            .get("token")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| DataError::UnexpectedResponse("missing widget token".into()))?;
        let request = timeseries
            .get("request")
            .ok_or_else(|| DataError::UnexpectedResponse("missing widget request".into()))?;

        let widget_body = self
            .get_api(
                WIDGET_URL,
                &[("req", &request.to_string()), ("token", token)],
            )
            .await?;
        let widget: serde_json::Value = serde_json::from_str(strip_prefix(&widget_body))
            .map_err(|e| DataError::UnexpectedResponse(format!("widget payload: {e}")))?;

        let points = widget
            .pointer("/default/timelineData")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| DataError::UnexpectedResponse("missing timeline data".into()))?;

        Ok(points
            .iter()
            .filter_map(|point| point.pointer("/value/0").and_then(serde_json::Value::as_f64))
            .collect())
    }

    async fn get_api(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut query: Vec<(&str, &str)> = vec![("hl", "en-US"), ("tz", "0")];
        query.extend_from_slice(params);

        let response = self.http.get(url).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(DataError::Fetch(format!(
                "trends HTTP {} from {url}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

/// Google Trends API responses carry an anti-JSON-hijacking prefix.
fn strip_prefix(body: &str) -> &str {
    match body.find('{') {
        Some(idx) => &body[idx..],
        None => body,
    }
}

fn summarize_series(keyword: &str, values: &[f64]) -> TrendSummary {
    let average = values.iter().sum::<f64>() / values.len() as f64;
    let current = values[values.len() - 1];

    let half = values.len() / 2;
    let direction = if half == 0 {
        TrendDirection::Stable
    } else {
        let first = values[..half].iter().sum::<f64>() / half as f64;
        let second = values[half..].iter().sum::<f64>() / (values.len() - half) as f64;
        if first <= 0.0 {
            TrendDirection::Stable
        } else if second > first * RISING_THRESHOLD {
            TrendDirection::Rising
        } else if second < first * DECLINING_THRESHOLD {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    };

    TrendSummary {
        keyword: keyword.to_string(),
        average_interest: average,
        current_interest: current,
        direction,
    }
}
