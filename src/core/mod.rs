//! Orchestration logic: step parsing, dispatch, and the execution engine.

pub mod dispatch;
pub mod engine;
pub mod step;

pub use engine::{Engine, EngineState, RunOutcome, RunReport};
pub use step::ParsedStep;
