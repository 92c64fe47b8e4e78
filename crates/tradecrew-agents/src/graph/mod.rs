//! Pipeline state and the six-stage orchestrator

pub mod state;
pub mod trading_graph;

pub use state::{PipelineState, StatePatch};
pub use trading_graph::{StepObserver, TradingGraph};
