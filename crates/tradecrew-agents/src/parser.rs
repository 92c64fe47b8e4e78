//! LLM response parsing
//!
//! Turns free-form LLM text into a structured signal, confidence, and
//! summary. Priority order: a whole-response JSON object, then the
//! first ```json fenced block, then keyword heuristics over the raw
//! text. The trigger words and default confidences here are relied on
//! by every downstream confidence computation, so treat them as a
//! fixed lookup table.

use serde_json::{Map, Value};
use tradecrew_core::{AgentRole, AnalysisResult, Signal};

/// Parse a generic agent response into an `AnalysisResult`.
pub fn parse_response(role: AgentRole, ticker: &str, response: &str) -> AnalysisResult {
    if let Some(obj) = extract_json_object(response) {
        let summary = obj
            .get("summary")
            .and_then(Value::as_str)
            .or_else(|| obj.get("rationale").and_then(Value::as_str))
            .map_or_else(|| response.to_string(), str::to_string);

        let mut signal = normalize_signal(
            obj.get("signal").and_then(Value::as_str).unwrap_or_default(),
        );
        let mut confidence = parse_confidence(obj.get("confidence"));

        // An unrecognized signal token normalizes to neutral and is
        // re-derived from the summary text.
        if signal == Signal::Neutral {
            (signal, confidence) = heuristic_signal(&summary);
        }

        AnalysisResult::new(role, ticker, summary, signal, confidence)
    } else {
        let (signal, confidence) = heuristic_signal(response);
        AnalysisResult::new(role, ticker, response, signal, confidence)
    }
}

/// Extract a JSON object from a response.
///
/// Either the whole trimmed response is one object, or the first
/// ```json fenced block is. Anything else yields `None`.
pub fn extract_json_object(response: &str) -> Option<Map<String, Value>> {
    let trimmed = response.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(Value::Object(obj)) = serde_json::from_str(trimmed) {
            return Some(obj);
        }
    } else if let Some(after) = response.split_once("```json").map(|(_, rest)| rest) {
        let block = after.split("```").next().unwrap_or_default().trim();
        if let Ok(Value::Object(obj)) = serde_json::from_str(block) {
            return Some(obj);
        }
    }
    None
}

/// Keyword heuristic over lowercased free text.
///
/// Checked in priority order; the confidence defaults are part of the
/// contract, not tunables.
pub fn heuristic_signal(text: &str) -> (Signal, f64) {
    let lower = text.to_lowercase();
    if lower.contains("strong buy") || lower.contains("strongly bullish") {
        (Signal::StrongBuy, 85.0)
    } else if lower.contains("buy") || lower.contains("bullish") {
        (Signal::Buy, 70.0)
    } else if lower.contains("strong sell") || lower.contains("strongly bearish") {
        (Signal::StrongSell, 85.0)
    } else if lower.contains("sell") || lower.contains("bearish") {
        (Signal::Sell, 70.0)
    } else if lower.contains("hold") {
        (Signal::Hold, 60.0)
    } else {
        (Signal::Neutral, 50.0)
    }
}

/// Map a raw signal string onto the closed trade-signal vocabulary.
pub fn normalize_signal(raw: &str) -> Signal {
    let s = raw.trim().to_lowercase();
    if s.contains("strong") && s.contains("buy") {
        Signal::StrongBuy
    } else if s == "buy" || s.contains("bull") {
        Signal::Buy
    } else if s.contains("strong") && s.contains("sell") {
        Signal::StrongSell
    } else if s == "sell" || s.contains("bear") {
        Signal::Sell
    } else if s == "hold" || s.contains("neutral") {
        Signal::Hold
    } else {
        Signal::Neutral
    }
}

/// Clean up a confidence value from parsed JSON.
///
/// Numbers pass through; strings are stripped of `%`, "confidence",
/// and ":" before parsing; everything else defaults to 50.
pub fn parse_confidence(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(50.0),
        Some(Value::String(s)) => {
            let cleaned = s
                .to_lowercase()
                .replace('%', "")
                .replace("confidence", "")
                .replace(':', "");
            cleaned.trim().parse().unwrap_or(50.0)
        }
        _ => 50.0,
    }
}
