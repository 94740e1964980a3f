//! Industry insight engine: async stages, collaborators, and the controller.
//!
//! A request flows `Reasoning → (ToolExecution → Reasoning)* → Reflection`,
//! loops back to reasoning while the reflection budget allows, and finishes
//! either directly or through the bull/bear debate and report. The
//! deterministic pieces live in the `coordination` crate.

pub mod agents;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod state_machine;
pub mod tools;

pub use config::InsightConfig;
pub use orchestrator::{Collaborators, Orchestrator, RunOutcome};
