//! Deterministic core of the industry insight engine.
//!
//! This crate holds everything that does not touch the network:
//!
//! - [`state`]: the per-request [`AgentState`] and the append-only message log
//! - [`decision`]: the structured next action chosen by the reasoning stage
//! - [`decode`]: the shared cleanup and JSON decoder for model output
//! - [`reflection`]: reflection verdicts and the retry budget
//! - [`debate`]: debate outcome, judge decoding, brief, and report rendering
//! - [`ontology`]: knowledge graph labels, relations, and schema text
//! - [`error`]: the [`StageFailure`] taxonomy
//!
//! The async stages, collaborators and controller live in `insight-agents`.

#![allow(clippy::uninlined_format_args)]

pub mod debate;
pub mod decision;
pub mod decode;
pub mod error;
pub mod ontology;
pub mod reflection;
pub mod state;

pub use debate::{render_report, DebateBrief, DebateOutcome};
pub use decision::{Decision, FinalAnswer};
pub use decode::{decode_json, DecodeError};
pub use error::StageFailure;
pub use reflection::{ReflectionBudget, ReflectionVerdict, DEFAULT_MAX_REFLECTIONS};
pub use state::{AgentState, Message, MessageLog, Role, StateUpdate};
