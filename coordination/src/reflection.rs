//! Reflection verdicts and the retry budget behind the quality gate.
//!
//! The gate runs once per candidate answer. Its counter always moves forward
//! by one per evaluated visit, and once the budget is spent the gate passes
//! without asking the model, so the reasoning/reflection loop terminates.

use serde::{Deserialize, Serialize};

use crate::decode::decode_json;
use crate::error::StageFailure;

/// Default number of evaluated reflection visits per request.
pub const DEFAULT_MAX_REFLECTIONS: u32 = 2;

/// Observation emitted when the gate is reached without a final answer.
pub const SKIPPED_OBSERVATION: &str = "Reflection skipped: no final answer to evaluate.";

/// Outcome of one reflection visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionVerdict {
    pub passed: bool,
    pub reason: String,
    /// Set when the pass was forced because the budget ran out.
    #[serde(default)]
    pub budget_exhausted: bool,
}

impl ReflectionVerdict {
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
            budget_exhausted: false,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
            budget_exhausted: false,
        }
    }

    /// Forced pass once `used >= max`.
    pub fn exhausted(budget: ReflectionBudget) -> Self {
        let signal = StageFailure::BudgetExhausted {
            used: budget.used,
            max: budget.max,
        };
        Self {
            passed: true,
            reason: signal.to_string(),
            budget_exhausted: true,
        }
    }

    /// Default pass used when the critique itself could not be obtained.
    pub fn proceeding(diagnostic: impl std::fmt::Display) -> Self {
        Self::pass(format!("proceeding with answer ({})", diagnostic))
    }

    /// Decode `{"pass": bool, "reason": str}`; anything else passes by default.
    pub fn from_model_output(raw: &str) -> Self {
        match decode_json::<VerdictWire>(raw) {
            Ok(wire) => {
                let reason = wire
                    .reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| String::from("no reason given"));
                if wire.pass {
                    Self::pass(reason)
                } else {
                    Self::fail(reason)
                }
            }
            Err(e) => Self::proceeding(StageFailure::from(e)),
        }
    }

    /// Observation text appended to the message log.
    pub fn observation(&self) -> String {
        if self.passed {
            format!("Reflection PASSED: {}", self.reason)
        } else {
            format!("Reflection FAILED: {}", self.reason)
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerdictWire {
    #[serde(alias = "passed")]
    pass: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Reflection counter against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionBudget {
    /// Visits already counted.
    pub used: u32,
    /// `max_reflections`.
    pub max: u32,
}

impl ReflectionBudget {
    pub fn new(used: u32, max: u32) -> Self {
        Self { used, max }
    }

    /// Checked before a visit: no more model-evaluated reflections.
    pub fn is_spent(&self) -> bool {
        self.used >= self.max
    }

    /// Checked after a failed visit: another visit can still happen.
    ///
    /// Visit `max + 1` is the forced pass, so a failure at `used == max`
    /// still loops back once more.
    pub fn allows_retry(&self) -> bool {
        self.used <= self.max
    }

    /// Budget after counting one more visit.
    pub fn consumed(self) -> Self {
        Self {
            used: self.used.saturating_add(1),
            max: self.max,
        }
    }
}

impl std::fmt::Display for ReflectionBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.used, self.max)
    }
}
