//! Application configuration

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tradecrew_data::SourceConfig;
use tradecrew_llm::LlmConfig;

/// How aggressively the trader and risk manager should lean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl Default for RiskTolerance {
    fn default() -> Self {
        Self::Moderate
    }
}

impl FromStr for RiskTolerance {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(PipelineError::Config(format!(
                "unknown risk tolerance '{other}' (expected conservative, moderate, or aggressive)"
            ))),
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        };
        f.write_str(name)
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Total debate rounds including the opening round
    pub max_debate_rounds: u32,

    pub risk_tolerance: RiskTolerance,

    /// Price-history window in days
    pub analysis_period_days: u32,

    /// Worker-pool size for the analyst fan-out. Bounded on purpose:
    /// each analyst issues a blocking LLM call and a local backend
    /// saturates quickly.
    pub max_parallel_agents: usize,

    /// Default watchlist for batch runs
    pub tickers: Vec<String>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            max_debate_rounds: 2,
            risk_tolerance: RiskTolerance::Moderate,
            analysis_period_days: 90,
            max_parallel_agents: 2,
            tickers: ["AAPL", "MSFT", "GOOGL", "NVDA", "AMZN"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl TradingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_debate_rounds < 1 {
            return Err(PipelineError::Config(
                "max_debate_rounds must be at least 1".to_string(),
            ));
        }
        if self.analysis_period_days < 7 {
            return Err(PipelineError::Config(
                "analysis_period_days must be at least 7".to_string(),
            ));
        }
        if self.tickers.is_empty() {
            return Err(PipelineError::Config(
                "tickers list must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Secondary data-source switches, layered over [`SourceConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub enable_google_news: bool,
    pub enable_sec_edgar: bool,
    pub enable_google_trends: bool,
    pub google_news_max_results: usize,
    pub sec_edgar_max_filings: usize,
    pub google_trends_timeframe: String,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            enable_google_news: true,
            enable_sec_edgar: true,
            enable_google_trends: true,
            google_news_max_results: 10,
            sec_edgar_max_filings: 5,
            google_trends_timeframe: "today 3-m".to_string(),
        }
    }
}

impl From<&DataSourceConfig> for SourceConfig {
    fn from(config: &DataSourceConfig) -> Self {
        Self {
            enable_web_news: config.enable_google_news,
            enable_filings: config.enable_sec_edgar,
            enable_trends: config.enable_google_trends,
            web_news_max_results: config.google_news_max_results,
            max_filings: config.sec_edgar_max_filings,
            trends_timeframe: config.google_trends_timeframe.clone(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub trading: TradingConfig,
    pub data_sources: DataSourceConfig,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let llm = LlmConfig::from_env().map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut trading = TradingConfig::default();
        if let Some(rounds) = env_parse::<u32>("MAX_DEBATE_ROUNDS") {
            trading.max_debate_rounds = rounds;
        }
        if let Ok(tolerance) = std::env::var("RISK_TOLERANCE") {
            trading.risk_tolerance = tolerance.parse()?;
        }
        if let Some(days) = env_parse::<u32>("ANALYSIS_PERIOD_DAYS") {
            trading.analysis_period_days = days;
        }
        if let Some(parallel) = env_parse::<usize>("MAX_PARALLEL_AGENTS") {
            trading.max_parallel_agents = parallel.max(1);
        }
        if let Ok(tickers) = std::env::var("TICKERS") {
            let parsed: Vec<String> = tickers
                .split(',')
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
            if !parsed.is_empty() {
                trading.tickers = parsed;
            }
        }
        trading.validate()?;

        let mut data_sources = DataSourceConfig::default();
        if let Some(enabled) = env_bool("ENABLE_GOOGLE_NEWS") {
            data_sources.enable_google_news = enabled;
        }
        if let Some(enabled) = env_bool("ENABLE_SEC_EDGAR") {
            data_sources.enable_sec_edgar = enabled;
        }
        if let Some(enabled) = env_bool("ENABLE_GOOGLE_TRENDS") {
            data_sources.enable_google_trends = enabled;
        }
        if let Some(max) = env_parse::<usize>("GOOGLE_NEWS_MAX_RESULTS") {
            data_sources.google_news_max_results = max;
        }
        if let Some(max) = env_parse::<usize>("SEC_EDGAR_MAX_FILINGS") {
            data_sources.sec_edgar_max_filings = max;
        }
        if let Ok(timeframe) = std::env::var("GOOGLE_TRENDS_TIMEFRAME") {
            data_sources.google_trends_timeframe = timeframe;
        }

        Ok(Self {
            llm,
            trading,
            data_sources,
        })
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_trading_config_is_valid() {
        let config = TradingConfig::default();
        assert_eq!(config.max_debate_rounds, 2);
        assert_eq!(config.max_parallel_agents, 2);
        assert_eq!(config.tickers.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_rounds() {
        let config = TradingConfig {
            max_debate_rounds: 0,
            ..TradingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_short_period() {
        let config = TradingConfig {
            analysis_period_days: 3,
            ..TradingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_risk_tolerance_parsing() {
        assert_eq!(
            "Aggressive".parse::<RiskTolerance>().unwrap(),
            RiskTolerance::Aggressive
        );
        assert!("yolo".parse::<RiskTolerance>().is_err());
    }

    #[test]
    fn test_source_config_mapping() {
        let config = DataSourceConfig {
            enable_google_trends: false,
            sec_edgar_max_filings: 3,
            ..DataSourceConfig::default()
        };
        let mapped = SourceConfig::from(&config);
        assert!(!mapped.enable_trends);
        assert_eq!(mapped.max_filings, 3);
        assert!(mapped.enable_web_news);
    }
}
