//! Watchlist screener
//!
//! Single-shot alternative to the full pipeline: fetch a compact data
//! snapshot per ticker, then ask the LLM once to rank the whole
//! watchlist. Tickers whose data fetch fails are reported in the
//! result's error list and excluded from the prompt rather than
//! failing the run.

use crate::config::TradingConfig;
use crate::error::Result;
use crate::graph::StepObserver;
use crate::parser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};
use tradecrew_core::{Signal, StepResult};
use tradecrew_data::{MarketData, compute_indicators};
use tradecrew_llm::LlmClient;
use uuid::Uuid;

const SCREENER_SYSTEM_PROMPT: &str = "You are an equity screener. Given a \
    data snapshot per ticker, rank the most attractive opportunities. \
    Respond with a JSON object containing a \"picks\" array; each pick has \
    \"ticker\", \"signal\" (strong_buy, buy, hold, sell, strong_sell), \
    \"confidence\" (0-100), \"rationale\", \"position_size_pct\", \
    \"time_horizon\", and \"risks\" (a list of strings). Order picks from \
    most to least attractive.";

/// One ranked entry in a screener run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerPick {
    pub ticker: String,
    pub signal: Signal,
    pub confidence: f64,
    pub rationale: String,
    pub position_size_pct: Option<f64>,
    pub time_horizon: String,
    pub risks: Vec<String>,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerResult {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub watchlist: Vec<String>,
    pub picks: Vec<ScreenerPick>,
    pub errors: Vec<String>,
}

/// Split raw watchlist text on commas and whitespace, uppercase each
/// symbol, and drop duplicates while keeping first-seen order.
pub fn parse_watchlist_input(input: &str) -> Vec<String> {
    let mut tickers = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        let ticker = token.trim().to_uppercase();
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}

struct TickerSnapshot {
    ticker: String,
    block: String,
}

pub struct Screener {
    llm: Arc<dyn LlmClient>,
    data: Arc<dyn MarketData>,
    config: TradingConfig,
    observer: Option<StepObserver>,
}

impl Screener {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        data: Arc<dyn MarketData>,
        config: TradingConfig,
    ) -> Self {
        Self {
            llm,
            data,
            config,
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
                warn!(step = %step.step_name, "screener observer panicked");
            }
        }
    }

    /// Screen a raw watchlist string, returning at most `top_n` picks.
    pub async fn screen(&self, input: &str, top_n: usize) -> Result<ScreenerResult> {
        let watchlist = parse_watchlist_input(input);
        let run_id = Uuid::new_v4().simple().to_string()[..12].to_string();
        info!(run_id, tickers = watchlist.len(), "screener run starting");

        let mut snapshots = Vec::new();
        let mut errors = Vec::new();
        for ticker in &watchlist {
            self.emit(&StepResult::pending(ticker.clone()));
            match self.snapshot(ticker).await {
                Ok(snapshot) => {
                    self.emit(
                        &StepResult::completed(ticker.clone())
                            .with_data("fetched", json!(true)),
                    );
                    snapshots.push(snapshot);
                }
                Err(e) => {
                    warn!(ticker, error = %e, "screener data fetch failed");
                    self.emit(&StepResult::error(ticker.clone(), e.to_string()));
                    errors.push(format!("{ticker}: {e}"));
                }
            }
        }

        let mut picks = Vec::new();
        if snapshots.is_empty() {
            errors.push("No valid ticker data available".to_string());
        } else {
            let prompt = build_prompt(&snapshots);
            let response = self.llm.generate(&prompt, SCREENER_SYSTEM_PROMPT).await?;
            picks = parse_picks(&response, &snapshots);
        }

        // Stable sort keeps the LLM's ordering among equal confidences.
        picks.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (i, pick) in picks.iter_mut().enumerate() {
            pick.rank = i + 1;
        }
        picks.truncate(top_n);

        Ok(ScreenerResult {
            run_id,
            generated_at: Utc::now(),
            watchlist,
            picks,
            errors,
        })
    }

    async fn snapshot(&self, ticker: &str) -> Result<TickerSnapshot> {
        let prices = self
            .data
            .price_history(ticker, None, self.config.analysis_period_days)
            .await?;
        let info = self.data.stock_info(ticker).await?;
        let indicators = compute_indicators(&prices)?;

        let mut block = format!("=== {ticker} ({})\n", info.display_name());
        if let Some(sector) = &info.sector {
            let _ = writeln!(block, "sector: {sector}");
        }
        for key in [
            "current_price",
            "price_change_pct",
            "rsi",
            "macd",
            "sma_20",
            "sma_50",
            "volume_trend",
        ] {
            if let Some(value) = indicators.get(key) {
                let _ = writeln!(block, "{key}: {value:.4}");
            }
        }

        Ok(TickerSnapshot {
            ticker: ticker.to_string(),
            block,
        })
    }
}

fn build_prompt(snapshots: &[TickerSnapshot]) -> String {
    let mut prompt = format!(
        "Screen these {} tickers and rank the best opportunities.\n\n",
        snapshots.len()
    );
    for snapshot in snapshots {
        prompt.push_str(&snapshot.block);
        prompt.push('\n');
    }
    prompt
}

/// The screener's own signal vocabulary. Unlike the per-agent
/// normalizer, only the full word "bullish"/"bearish" counts and the
/// default is hold.
fn normalize_pick_signal(raw: &str) -> Signal {
    let s = raw.trim().to_lowercase();
    if s.contains("strong") && s.contains("buy") {
        Signal::StrongBuy
    } else if s == "buy" || s.contains("bullish") {
        Signal::Buy
    } else if s.contains("strong") && s.contains("sell") {
        Signal::StrongSell
    } else if s == "sell" || s.contains("bearish") {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

fn parse_picks(response: &str, snapshots: &[TickerSnapshot]) -> Vec<ScreenerPick> {
    if let Some(obj) = parser::extract_json_object(response) {
        if let Some(items) = obj.get("picks").and_then(Value::as_array) {
            return items.iter().filter_map(parse_pick).collect();
        }
    }
    fallback_picks(response, snapshots)
}

fn parse_pick(item: &Value) -> Option<ScreenerPick> {
    let obj = item.as_object()?;
    let ticker = obj.get("ticker")?.as_str()?.to_uppercase();
    let signal = normalize_pick_signal(
        obj.get("signal").and_then(Value::as_str).unwrap_or_default(),
    );
    let confidence = parser::parse_confidence(obj.get("confidence"));
    let rationale = obj
        .get("rationale")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let position_size_pct = obj.get("position_size_pct").and_then(Value::as_f64);
    let time_horizon = obj
        .get("time_horizon")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let risks = obj
        .get("risks")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ScreenerPick {
        ticker,
        signal,
        confidence,
        rationale,
        position_size_pct,
        time_horizon,
        risks,
        rank: 0,
    })
}

/// Free-text recovery: one hold-by-default pick per fetched ticker,
/// upgraded only when the response mentions the ticker and carries an
/// explicit buy/sell/hold phrase.
fn fallback_picks(response: &str, snapshots: &[TickerSnapshot]) -> Vec<ScreenerPick> {
    let lower = response.to_lowercase();
    snapshots
        .iter()
        .map(|snapshot| {
            let mut signal = Signal::Hold;
            let mut confidence = 50.0;
            if lower.contains(&snapshot.ticker.to_lowercase()) {
                (signal, confidence) = if lower.contains("strong buy") {
                    (Signal::StrongBuy, 85.0)
                } else if lower.contains("buy") {
                    (Signal::Buy, 70.0)
                } else if lower.contains("strong sell") {
                    (Signal::StrongSell, 85.0)
                } else if lower.contains("sell") {
                    (Signal::Sell, 70.0)
                } else if lower.contains("hold") {
                    (Signal::Hold, 60.0)
                } else {
                    (Signal::Hold, 50.0)
                };
            }
            let rationale: String = response.chars().take(300).collect();
            ScreenerPick {
                ticker: snapshot.ticker.clone(),
                signal,
                confidence,
                rationale,
                position_size_pct: None,
                time_horizon: String::new(),
                risks: Vec::new(),
                rank: 0,
            }
        })
        .collect()
}
