//! Trade signal and verdict vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical recommendation tokens produced by agents.
///
/// The first six tokens are the trade-signal vocabulary shared by
/// analysts, researchers, and the trader. The risk manager and the
/// verifier use their own verdict subsets of the same closed set, so
/// a result's `signal` field is always one of these values and never
/// free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    // Trade signals
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
    Neutral,
    // Risk-manager verdicts
    Approve,
    Modify,
    Reject,
    Review,
    // Verifier verdicts
    Approved,
    Flagged,
    Rejected,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "strong_buy",
            Self::Buy => "buy",
            Self::Hold => "hold",
            Self::Sell => "sell",
            Self::StrongSell => "strong_sell",
            Self::Neutral => "neutral",
            Self::Approve => "approve",
            Self::Modify => "modify",
            Self::Reject => "reject",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Flagged => "flagged",
            Self::Rejected => "rejected",
        }
    }

    /// Whether this token belongs to the shared trade-signal vocabulary.
    pub fn is_trade_signal(&self) -> bool {
        matches!(
            self,
            Self::StrongBuy
                | Self::Buy
                | Self::Hold
                | Self::Sell
                | Self::StrongSell
                | Self::Neutral
        )
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::Neutral
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Signal::StrongBuy).unwrap(),
            "\"strong_buy\""
        );
        let signal: Signal = serde_json::from_str("\"strong_sell\"").unwrap();
        assert_eq!(signal, Signal::StrongSell);
    }

    #[test]
    fn test_trade_signal_classification() {
        assert!(Signal::Buy.is_trade_signal());
        assert!(Signal::Neutral.is_trade_signal());
        assert!(!Signal::Reject.is_trade_signal());
        assert!(!Signal::Flagged.is_trade_signal());
    }

    #[test]
    fn test_default_is_neutral() {
        assert_eq!(Signal::default(), Signal::Neutral);
    }
}
