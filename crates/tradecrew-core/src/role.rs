//! Agent role enumeration

use serde::{Deserialize, Serialize};
use std::fmt;

/// The nine roles that participate in a pipeline run.
///
/// Four analysts fan out concurrently, two researchers debate,
/// then the trader, risk manager, and verifier run in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    FundamentalAnalyst,
    SentimentAnalyst,
    NewsAnalyst,
    TechnicalAnalyst,
    BullResearcher,
    BearResearcher,
    Trader,
    RiskManager,
    Verifier,
}

impl AgentRole {
    /// Stable snake_case identifier used in step events and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FundamentalAnalyst => "fundamental_analyst",
            Self::SentimentAnalyst => "sentiment_analyst",
            Self::NewsAnalyst => "news_analyst",
            Self::TechnicalAnalyst => "technical_analyst",
            Self::BullResearcher => "bull_researcher",
            Self::BearResearcher => "bear_researcher",
            Self::Trader => "trader",
            Self::RiskManager => "risk_manager",
            Self::Verifier => "verifier",
        }
    }

    /// Human-readable name for report rendering.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FundamentalAnalyst => "Fundamental Analyst",
            Self::SentimentAnalyst => "Sentiment Analyst",
            Self::NewsAnalyst => "News Analyst",
            Self::TechnicalAnalyst => "Technical Analyst",
            Self::BullResearcher => "Bull Researcher",
            Self::BearResearcher => "Bear Researcher",
            Self::Trader => "Trader",
            Self::RiskManager => "Risk Manager",
            Self::Verifier => "Verifier",
        }
    }

    /// The four roles executed concurrently in the analyst fan-out stage.
    pub fn analysts() -> [Self; 4] {
        [
            Self::FundamentalAnalyst,
            Self::SentimentAnalyst,
            Self::NewsAnalyst,
            Self::TechnicalAnalyst,
        ]
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&AgentRole::FundamentalAnalyst).unwrap();
        assert_eq!(json, "\"fundamental_analyst\"");

        let role: AgentRole = serde_json::from_str("\"risk_manager\"").unwrap();
        assert_eq!(role, AgentRole::RiskManager);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(AgentRole::BullResearcher.to_string(), "bull_researcher");
        assert_eq!(AgentRole::Verifier.to_string(), "verifier");
    }

    #[test]
    fn test_analyst_roles() {
        let analysts = AgentRole::analysts();
        assert_eq!(analysts.len(), 4);
        assert!(!analysts.contains(&AgentRole::Trader));
    }
}
