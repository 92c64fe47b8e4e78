//! Market data collaborators for the tradecrew pipeline.
//!
//! Price history and company news come from Yahoo Finance, regulatory
//! filings from SEC EDGAR, broader headlines from Google News RSS, and
//! search-interest trends from Google Trends. Each optional source is
//! independently enablable and degrades to an empty or neutral payload
//! instead of raising. Technical indicators and their qualitative
//! signal summary are computed locally from the price series.

pub mod edgar;
pub mod error;
pub mod indicators;
pub mod provider;
pub mod trends;
pub mod types;
pub mod webnews;
pub mod yahoo;

pub use error::{DataError, Result};
pub use indicators::{SignalSummary, compute_indicators, summarize_signals};
pub use provider::{MarketData, MarketDataProvider, SourceConfig, SourceStatus};
pub use types::{Filing, NewsItem, PriceBar, StockInfo, TrendDirection, TrendSummary};
