// Plan-Execute-Replan Engine
// Feature: Plan-Execute-Replan Engine
//
// PLANNING -> (EXECUTING <-> REPLANNING) -> DONE. The loop ends only when
// the LLM answers with a `response` action.

mod decision;
pub mod engine;
pub(crate) mod executor;

pub use engine::{PlanExecuteEngine, PneEventStream};
pub use crate::models::PneOutcome;
