//! Agent roles, pipeline orchestration, and the watchlist screener.
//!
//! The centerpiece is [`graph::TradingGraph`]: a fixed six-stage
//! pipeline that fetches market data, fans out four analyst agents
//! concurrently, runs a bull/bear debate, synthesizes a trade
//! decision, applies the risk-review policy, and finishes with a
//! verification pass. Stage failures after the data fetch degrade the
//! run instead of aborting it.

pub mod agents;
pub mod config;
pub mod error;
pub mod graph;
pub mod parser;
pub mod report;
pub mod screener;

pub use config::{AppConfig, DataSourceConfig, RiskTolerance, TradingConfig};
pub use error::{PipelineError, Result};
pub use graph::{PipelineState, StatePatch, StepObserver, TradingGraph};
pub use screener::{Screener, ScreenerPick, ScreenerResult, parse_watchlist_input};
