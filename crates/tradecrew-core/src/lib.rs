//! Shared domain types for the tradecrew multi-agent trading pipeline.
//!
//! This crate defines the vocabulary every other crate speaks:
//! agent roles, trade signals, analysis results, pipeline step events,
//! and the final trading decision snapshot. It deliberately carries no
//! I/O or orchestration logic.

pub mod result;
pub mod role;
pub mod signal;

pub use result::{AnalysisResult, DebateRound, StepResult, StepStatus, TradingDecision};
pub use role::AgentRole;
pub use signal::Signal;
