//! Model-backed stages of the request lifecycle.
//!
//! Each stage reads the current [`coordination::AgentState`], makes at most
//! one model call, and returns a [`coordination::StateUpdate`]. Failures are
//! folded into fallback values inside the stage.

pub mod debate;
pub mod reasoning;
pub mod reflection;

use std::time::Duration;

pub use debate::DebateSynthesizer;
pub use reasoning::ReasoningEngine;
pub use reflection::ReflectionGate;

/// Sampling settings for one stage's model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallSettings {
    pub temperature: f32,
    pub timeout: Duration,
}

impl CallSettings {
    pub fn new(temperature: f32, timeout: Duration) -> Self {
        Self {
            temperature,
            timeout,
        }
    }
}
