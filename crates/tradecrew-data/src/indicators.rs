//! Technical indicator computation and qualitative signal summary
//!
//! Produces a flat map of named numeric indicators from a daily price
//! series, then derives per-indicator qualitative readings and an
//! aggregate bullish/bearish/neutral verdict from that map. Indicators
//! whose lookback window exceeds the available rows are omitted from
//! the map rather than emitted as garbage.

use crate::error::{DataError, Result};
use crate::types::PriceBar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage, RelativeStrengthIndex,
    SimpleMovingAverage,
};
use ta::{DataItem, Next};

/// Minimum number of price rows required for any indicator output.
pub const MIN_ROWS: usize = 14;

const STOCH_PERIOD: usize = 14;
const VOLUME_TREND_WINDOW: usize = 5;

fn init_err(e: impl std::fmt::Display) -> DataError {
    DataError::UnexpectedResponse(format!("indicator setup failed: {e}"))
}

/// Run a streaming `ta` indicator over a series and collect its output.
fn series<I: Next<f64, Output = f64>>(mut indicator: I, values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| indicator.next(*v)).collect()
}

/// Compute the indicator map for a price series.
///
/// Requires at least [`MIN_ROWS`] rows. Longer-window indicators
/// (SMA 20/50, Bollinger bands, stochastic %D) only appear once the
/// series is long enough to cover their lookback.
pub fn compute_indicators(prices: &[PriceBar]) -> Result<BTreeMap<String, f64>> {
    if prices.len() < MIN_ROWS {
        return Err(DataError::InsufficientData {
            required: MIN_ROWS,
            got: prices.len(),
        });
    }

    let closes: Vec<f64> = prices.iter().map(|bar| bar.close).collect();
    let rows = prices.len();
    let mut map = BTreeMap::new();

    if rows >= 20 {
        let sma = series(SimpleMovingAverage::new(20).map_err(init_err)?, &closes);
        map.insert("sma_20".to_string(), sma[rows - 1]);
    }
    if rows >= 50 {
        let sma = series(SimpleMovingAverage::new(50).map_err(init_err)?, &closes);
        map.insert("sma_50".to_string(), sma[rows - 1]);
    }

    let ema_12 = series(
        ExponentialMovingAverage::new(12).map_err(init_err)?,
        &closes,
    );
    let ema_26 = series(
        ExponentialMovingAverage::new(26).map_err(init_err)?,
        &closes,
    );
    map.insert("ema_12".to_string(), ema_12[rows - 1]);
    map.insert("ema_26".to_string(), ema_26[rows - 1]);

    // MACD as the EMA12/EMA26 difference, signal line as EMA9 of it
    let macd: Vec<f64> = ema_12
        .iter()
        .zip(ema_26.iter())
        .map(|(fast, slow)| fast - slow)
        .collect();
    let signal = series(ExponentialMovingAverage::new(9).map_err(init_err)?, &macd);
    map.insert("macd".to_string(), macd[rows - 1]);
    map.insert("macd_signal".to_string(), signal[rows - 1]);
    map.insert(
        "macd_histogram".to_string(),
        macd[rows - 1] - signal[rows - 1],
    );

    let rsi = series(RelativeStrengthIndex::new(14).map_err(init_err)?, &closes);
    map.insert("rsi".to_string(), rsi[rows - 1]);

    if rows >= 20 {
        let mut bands = BollingerBands::new(20, 2.0).map_err(init_err)?;
        let mut last = None;
        for close in &closes {
            last = Some(bands.next(*close));
        }
        if let Some(output) = last {
            map.insert("bb_upper".to_string(), output.upper);
            map.insert("bb_middle".to_string(), output.average);
            map.insert("bb_lower".to_string(), output.lower);
        }
    }

    let mut atr = AverageTrueRange::new(14).map_err(init_err)?;
    let mut atr_value = 0.0;
    for bar in prices {
        let item = DataItem::builder()
            .open(bar.open)
            .high(bar.high)
            .low(bar.low)
            .close(bar.close)
            .volume(bar.volume as f64)
            .build()
            .map_err(init_err)?;
        atr_value = atr.next(&item);
    }
    map.insert("atr".to_string(), atr_value);

    map.insert("stoch_k".to_string(), stochastic_k(prices, rows - 1));
    if rows >= STOCH_PERIOD + 2 {
        let d = (stochastic_k(prices, rows - 1)
            + stochastic_k(prices, rows - 2)
            + stochastic_k(prices, rows - 3))
            / 3.0;
        map.insert("stoch_d".to_string(), d);
    }

    map.insert("obv".to_string(), on_balance_volume(prices));

    let current = closes[rows - 1];
    map.insert("current_price".to_string(), current);
    map.insert(
        "price_change_pct".to_string(),
        (current / closes[0] - 1.0) * 100.0,
    );

    let avg_volume =
        prices.iter().map(|bar| bar.volume as f64).sum::<f64>() / rows as f64;
    map.insert("avg_volume".to_string(), avg_volume);
    map.insert("volume_trend".to_string(), volume_trend(prices, avg_volume));

    Ok(map)
}

/// %K over the trailing 14-row window ending at `idx`.
fn stochastic_k(prices: &[PriceBar], idx: usize) -> f64 {
    let start = (idx + 1).saturating_sub(STOCH_PERIOD);
    let window = &prices[start..=idx];
    let high = window.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);
    if (high - low).abs() < f64::EPSILON {
        return 50.0;
    }
    (prices[idx].close - low) / (high - low) * 100.0
}

fn on_balance_volume(prices: &[PriceBar]) -> f64 {
    let mut obv = 0.0;
    for pair in prices.windows(2) {
        if pair[1].close > pair[0].close {
            obv += pair[1].volume as f64;
        } else if pair[1].close < pair[0].close {
            obv -= pair[1].volume as f64;
        }
    }
    obv
}

/// Ratio of recent volume to the whole-period average.
fn volume_trend(prices: &[PriceBar], avg_volume: f64) -> f64 {
    if prices.len() < VOLUME_TREND_WINDOW || avg_volume <= 0.0 {
        return 1.0;
    }
    let recent = prices[prices.len() - VOLUME_TREND_WINDOW..]
        .iter()
        .map(|bar| bar.volume as f64)
        .sum::<f64>()
        / VOLUME_TREND_WINDOW as f64;
    recent / avg_volume
}

/// Qualitative readings derived from the indicator map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalSummary {
    /// Per-indicator reading, e.g. `rsi -> "overbought (bearish)"`.
    pub entries: BTreeMap<String, String>,
    /// Aggregate verdict: bullish, bearish, or neutral.
    pub overall: String,
    /// `max(bullish, bearish) / total * 100`, rounded to one decimal.
    pub confidence: f64,
}

/// Derive the qualitative signal summary from an indicator map.
pub fn summarize_signals(indicators: &BTreeMap<String, f64>) -> SignalSummary {
    let mut entries = BTreeMap::new();
    let price = indicators.get("current_price").copied();

    if let Some(rsi) = indicators.get("rsi") {
        let reading = if *rsi < 30.0 {
            "oversold (bullish)"
        } else if *rsi > 70.0 {
            "overbought (bearish)"
        } else {
            "neutral"
        };
        entries.insert("rsi".to_string(), reading.to_string());
    }

    if let (Some(macd), Some(signal)) =
        (indicators.get("macd"), indicators.get("macd_signal"))
    {
        let reading = if macd > signal {
            "bullish crossover"
        } else {
            "bearish crossover"
        };
        entries.insert("macd".to_string(), reading.to_string());
    }

    if let (Some(price), Some(sma)) = (price, indicators.get("sma_20")) {
        let reading = if price > *sma {
            "price above SMA20 (bullish)"
        } else {
            "price below SMA20 (bearish)"
        };
        entries.insert("sma_20".to_string(), reading.to_string());
    }

    if let (Some(price), Some(sma)) = (price, indicators.get("sma_50")) {
        let reading = if price > *sma {
            "price above SMA50 (bullish)"
        } else {
            "price below SMA50 (bearish)"
        };
        entries.insert("sma_50".to_string(), reading.to_string());
    }

    if let (Some(price), Some(upper), Some(lower)) = (
        price,
        indicators.get("bb_upper"),
        indicators.get("bb_lower"),
    ) {
        let reading = if price >= *upper {
            "at upper band (potential reversal)"
        } else if price <= *lower {
            "at lower band (potential bounce)"
        } else {
            "within bands (normal)"
        };
        entries.insert("bollinger".to_string(), reading.to_string());
    }

    if let Some(trend) = indicators.get("volume_trend") {
        let reading = if *trend > 1.5 {
            "high volume surge"
        } else if *trend < 0.5 {
            "low volume"
        } else {
            "normal volume"
        };
        entries.insert("volume".to_string(), reading.to_string());
    }

    if entries.is_empty() {
        return SignalSummary {
            entries,
            overall: "insufficient data".to_string(),
            confidence: 0.0,
        };
    }

    let bullish = entries
        .values()
        .filter(|v| v.contains("bullish") || v.contains("bounce"))
        .count();
    let bearish = entries
        .values()
        .filter(|v| v.contains("bearish") || v.contains("reversal"))
        .count();

    let overall = if bullish > bearish {
        "bullish"
    } else if bearish > bullish {
        "bearish"
    } else {
        "neutral"
    };
    let confidence =
        (bullish.max(bearish) as f64 / entries.len() as f64 * 1000.0).round() / 10.0;

    SignalSummary {
        entries,
        overall: overall.to_string(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = Utc::now() - Duration::days(closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PriceBar {
                date: start + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close: *close,
                volume: 1_000_000 + (i as u64 * 10_000),
            })
            .collect()
    }

    fn rising(n: usize) -> Vec<PriceBar> {
        bars(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
    }

    #[test]
    fn test_rejects_short_series() {
        let result = compute_indicators(&rising(13));
        assert!(matches!(
            result,
            Err(DataError::InsufficientData { required: 14, got: 13 })
        ));
    }

    #[test]
    fn test_minimum_series_has_core_indicators() {
        let map = compute_indicators(&rising(14)).unwrap();
        let rsi = map["rsi"];
        assert!((0.0..=100.0).contains(&rsi));
        assert!(map["current_price"] > 0.0);
        assert!(map.contains_key("atr"));
        assert!(map.contains_key("stoch_k"));
        // Longer lookbacks are not available yet
        assert!(!map.contains_key("sma_20"));
        assert!(!map.contains_key("bb_upper"));
    }

    #[test]
    fn test_longer_series_fills_in_windows() {
        let map = compute_indicators(&rising(60)).unwrap();
        assert!(map.contains_key("sma_20"));
        assert!(map.contains_key("sma_50"));
        assert!(map.contains_key("bb_upper"));
        assert!(map.contains_key("stoch_d"));
        // A steadily rising series keeps MACD above its signal line
        assert!(map["macd"] > 0.0);
        assert!(map["price_change_pct"] > 0.0);
    }

    #[test]
    fn test_volume_trend_defaults_to_one() {
        let map = compute_indicators(&rising(20)).unwrap();
        assert!(map["volume_trend"] > 0.0);
    }

    #[test]
    fn test_summary_counts_bullish_signals() {
        let mut indicators = BTreeMap::new();
        indicators.insert("rsi".to_string(), 25.0); // oversold (bullish)
        indicators.insert("macd".to_string(), 1.0);
        indicators.insert("macd_signal".to_string(), 0.5); // bullish crossover
        indicators.insert("current_price".to_string(), 105.0);
        indicators.insert("sma_20".to_string(), 100.0); // above (bullish)
        indicators.insert("volume_trend".to_string(), 1.0); // normal

        let summary = summarize_signals(&indicators);
        assert_eq!(summary.overall, "bullish");
        // 3 bullish out of 4 readings
        assert!((summary.confidence - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_neutral_on_tie() {
        let mut indicators = BTreeMap::new();
        indicators.insert("rsi".to_string(), 25.0); // bullish
        indicators.insert("macd".to_string(), 0.1);
        indicators.insert("macd_signal".to_string(), 0.5); // bearish

        let summary = summarize_signals(&indicators);
        assert_eq!(summary.overall, "neutral");
        assert!((summary.confidence - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_empty_map() {
        let summary = summarize_signals(&BTreeMap::new());
        assert_eq!(summary.overall, "insufficient data");
        assert!(summary.confidence.abs() < f64::EPSILON);
    }
}
