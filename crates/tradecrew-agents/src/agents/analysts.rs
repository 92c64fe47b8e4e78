//! The four concurrent analyst roles

use super::{RoleAgent, clip};
use crate::graph::PipelineState;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;
use tradecrew_core::{AgentRole, AnalysisResult};
use tradecrew_llm::LlmClient;

const JSON_INSTRUCTIONS: &str = "Respond with a JSON object containing exactly these keys:\n\
    \"signal\" (one of strong_buy, buy, hold, sell, strong_sell),\n\
    \"confidence\" (0-100),\n\
    \"summary\" (2-4 sentences explaining your reasoning).";

fn opt_num(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn opt_text(value: Option<&str>) -> &str {
    value.unwrap_or("n/a")
}

// ---------------------------------------------------------------------------
// Fundamental analyst
// ---------------------------------------------------------------------------

const FUNDAMENTAL_SYSTEM_PROMPT: &str = "You are a fundamental equity analyst. \
    You evaluate valuation, profitability, growth, and balance-sheet quality \
    from company fundamentals and state a clear trading signal. Be specific \
    about which metrics drive your view.";

pub struct FundamentalAnalyst {
    llm: Arc<dyn LlmClient>,
}

impl FundamentalAnalyst {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

impl RoleAgent for FundamentalAnalyst {
    fn role(&self) -> AgentRole {
        AgentRole::FundamentalAnalyst
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        FUNDAMENTAL_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let info = &state.stock_info;
        let mut prompt = format!(
            "Analyze the fundamentals of {} ({}) as of {}.\n\nCompany profile:\n",
            info.display_name(),
            state.ticker,
            state.analysis_date
        );
        let _ = writeln!(prompt, "- Sector: {}", opt_text(info.sector.as_deref()));
        let _ = writeln!(prompt, "- Industry: {}", opt_text(info.industry.as_deref()));
        let _ = writeln!(prompt, "- Market cap: {}", opt_num(info.market_cap));
        let _ = writeln!(prompt, "- Trailing P/E: {}", opt_num(info.pe_ratio));
        let _ = writeln!(prompt, "- Forward P/E: {}", opt_num(info.forward_pe));
        let _ = writeln!(prompt, "- Price/book: {}", opt_num(info.price_to_book));
        let _ = writeln!(prompt, "- Profit margin: {}", opt_num(info.profit_margin));
        let _ = writeln!(prompt, "- Revenue growth: {}", opt_num(info.revenue_growth));
        let _ = writeln!(prompt, "- Dividend yield: {}", opt_num(info.dividend_yield));
        let _ = writeln!(prompt, "- Debt/equity: {}", opt_num(info.debt_to_equity));
        let _ = writeln!(
            prompt,
            "- Return on equity: {}",
            opt_num(info.return_on_equity)
        );
        let _ = writeln!(prompt, "- Free cash flow: {}", opt_num(info.free_cash_flow));
        let _ = writeln!(prompt, "- Beta: {}", opt_num(info.beta));
        let _ = writeln!(
            prompt,
            "- 52-week range: {} - {}",
            opt_num(info.week_52_low),
            opt_num(info.week_52_high)
        );
        let _ = writeln!(prompt, "- Current price: {}", opt_num(info.current_price));
        let _ = write!(prompt, "\n{JSON_INSTRUCTIONS}");
        prompt
    }

    fn attach_details(&self, result: &mut AnalysisResult, state: &PipelineState) {
        result.add_detail("company", json!(state.stock_info.display_name()));
    }
}

// ---------------------------------------------------------------------------
// Sentiment analyst
// ---------------------------------------------------------------------------

const SENTIMENT_SYSTEM_PROMPT: &str = "You are a market sentiment analyst. \
    You read headlines and public search interest to gauge how the crowd \
    feels about a stock right now, and you translate that mood into a \
    trading signal.";

pub struct SentimentAnalyst {
    llm: Arc<dyn LlmClient>,
}

impl SentimentAnalyst {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

impl RoleAgent for SentimentAnalyst {
    fn role(&self) -> AgentRole {
        AgentRole::SentimentAnalyst
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        SENTIMENT_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let mut prompt = format!(
            "Assess current market sentiment for {} as of {}.\n\nRecent headlines:\n",
            state.ticker, state.analysis_date
        );
        if state.news.is_empty() {
            prompt.push_str("(no recent headlines)\n");
        }
        for item in state.news.iter().take(10) {
            let _ = writeln!(
                prompt,
                "- {} ({})",
                clip(&item.title, 200),
                item.publisher.as_deref().unwrap_or("unknown")
            );
        }

        if let Some(trends) = &state.trends {
            let _ = write!(
                prompt,
                "\nSearch interest for \"{}\": average {:.0}, current {:.0}, trend {}\n",
                trends.keyword,
                trends.average_interest,
                trends.current_interest,
                trends.direction
            );
        }

        let _ = write!(prompt, "\n{JSON_INSTRUCTIONS}");
        prompt
    }

    fn attach_details(&self, result: &mut AnalysisResult, state: &PipelineState) {
        result.add_detail("headlines_seen", json!(state.news.len().min(10)));
        if let Some(trends) = &state.trends {
            result.add_detail("trend_direction", json!(trends.direction));
        }
    }
}

// ---------------------------------------------------------------------------
// News analyst
// ---------------------------------------------------------------------------

const NEWS_SYSTEM_PROMPT: &str = "You are a news analyst covering equities. \
    You weigh company news, broader press coverage, and regulatory filings \
    for material catalysts, and judge whether the net news flow supports \
    buying, holding, or selling.";

pub struct NewsAnalyst {
    llm: Arc<dyn LlmClient>,
}

impl NewsAnalyst {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

impl RoleAgent for NewsAnalyst {
    fn role(&self) -> AgentRole {
        AgentRole::NewsAnalyst
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        NEWS_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let mut prompt = format!(
            "Evaluate the news flow around {} as of {}.\n\nCompany news:\n",
            state.ticker, state.analysis_date
        );
        if state.news.is_empty() {
            prompt.push_str("(none)\n");
        }
        for item in state.news.iter().take(10) {
            let _ = writeln!(prompt, "- {}", clip(&item.title, 200));
            if let Some(summary) = &item.summary {
                let _ = writeln!(prompt, "  {}", clip(summary, 400));
            }
        }

        if !state.web_news.is_empty() {
            prompt.push_str("\nBroader press coverage:\n");
            for item in state.web_news.iter().take(10) {
                let _ = writeln!(prompt, "- {}", clip(&item.title, 300));
            }
        }

        if !state.filings.is_empty() {
            prompt.push_str("\nRecent SEC filings:\n");
            for filing in &state.filings {
                let _ = writeln!(
                    prompt,
                    "- {} filed {}: {}",
                    filing.form,
                    filing.filing_date,
                    clip(&filing.description, 300)
                );
            }
        }

        let _ = write!(prompt, "\n{JSON_INSTRUCTIONS}");
        prompt
    }

    fn attach_details(&self, result: &mut AnalysisResult, state: &PipelineState) {
        result.add_detail(
            "sources",
            json!({
                "company_news": state.news.len(),
                "web_news": state.web_news.len(),
                "filings": state.filings.len(),
            }),
        );
    }
}

// ---------------------------------------------------------------------------
// Technical analyst
// ---------------------------------------------------------------------------

const TECHNICAL_SYSTEM_PROMPT: &str = "You are a technical analyst. You read \
    momentum, trend, volatility, and volume indicators computed from the \
    price series and state a trading signal grounded in those numbers.";

pub struct TechnicalAnalyst {
    llm: Arc<dyn LlmClient>,
}

impl TechnicalAnalyst {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

impl RoleAgent for TechnicalAnalyst {
    fn role(&self) -> AgentRole {
        AgentRole::TechnicalAnalyst
    }

    fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    fn system_prompt(&self) -> &str {
        TECHNICAL_SYSTEM_PROMPT
    }

    fn build_prompt(&self, state: &PipelineState) -> String {
        let mut prompt = format!(
            "Analyze the technical picture for {} as of {} ({} price rows).\n\nIndicators:\n",
            state.ticker,
            state.analysis_date,
            state.prices.len()
        );
        for (name, value) in &state.indicators {
            let _ = writeln!(prompt, "- {name}: {value:.4}");
        }

        if !state.signals.entries.is_empty() {
            prompt.push_str("\nDerived readings:\n");
            for (name, reading) in &state.signals.entries {
                let _ = writeln!(prompt, "- {name}: {reading}");
            }
            let _ = writeln!(
                prompt,
                "\nAggregate read: {} ({:.1}% agreement)",
                state.signals.overall, state.signals.confidence
            );
        }

        let _ = write!(prompt, "\n{JSON_INSTRUCTIONS}");
        prompt
    }

    fn attach_details(&self, result: &mut AnalysisResult, state: &PipelineState) {
        result.add_detail("indicators_used", json!(state.indicators.len()));
        result.add_detail("price_rows", json!(state.prices.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskTolerance;
    use tradecrew_data::NewsItem;

    fn state() -> PipelineState {
        let mut state =
            PipelineState::new("AAPL", "2025-08-01", RiskTolerance::Moderate, 2, 90);
        state.stock_info.name = Some("Apple Inc.".to_string());
        state.stock_info.sector = Some("Technology".to_string());
        state.news.push(NewsItem {
            title: "Apple beats expectations".to_string(),
            publisher: Some("Example Wire".to_string()),
            summary: Some("Revenue up across segments.".to_string()),
            url: None,
            published_at: None,
        });
        state.indicators.insert("rsi".to_string(), 55.0);
        state
    }

    fn noop_llm() -> Arc<dyn LlmClient> {
        struct Noop;
        #[async_trait::async_trait]
        impl LlmClient for Noop {
            async fn generate(
                &self,
                _prompt: &str,
                _system_prompt: &str,
            ) -> tradecrew_llm::Result<String> {
                Ok(String::new())
            }
            async fn is_available(&self) -> bool {
                true
            }
        }
        Arc::new(Noop)
    }

    #[test]
    fn test_fundamental_prompt_includes_profile() {
        let agent = FundamentalAnalyst::new(noop_llm());
        let prompt = agent.build_prompt(&state());
        assert!(prompt.contains("Apple Inc."));
        assert!(prompt.contains("Sector: Technology"));
        assert!(prompt.contains("signal"));
    }

    #[test]
    fn test_sentiment_prompt_includes_headlines() {
        let agent = SentimentAnalyst::new(noop_llm());
        let prompt = agent.build_prompt(&state());
        assert!(prompt.contains("Apple beats expectations"));
        assert!(prompt.contains("Example Wire"));
    }

    #[test]
    fn test_technical_prompt_includes_indicators() {
        let agent = TechnicalAnalyst::new(noop_llm());
        let prompt = agent.build_prompt(&state());
        assert!(prompt.contains("rsi: 55.0000"));
    }

    #[test]
    fn test_roles_are_distinct() {
        let llm = noop_llm();
        assert_eq!(
            FundamentalAnalyst::new(llm.clone()).role(),
            AgentRole::FundamentalAnalyst
        );
        assert_eq!(
            NewsAnalyst::new(llm.clone()).role(),
            AgentRole::NewsAnalyst
        );
        assert_eq!(
            TechnicalAnalyst::new(llm).role(),
            AgentRole::TechnicalAnalyst
        );
    }
}
