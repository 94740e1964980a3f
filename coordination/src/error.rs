//! Stage failure taxonomy.
//!
//! No variant here ever crosses a stage boundary as an `Err`. Stages build a
//! `StageFailure`, log it, and turn it into either a diagnostic observation
//! or a canonical fallback value.
//!
//! | Variant            | Fault | Typical fallback                          |
//! |--------------------|-------|-------------------------------------------|
//! | Decode             | yes   | synthetic decision / default verdict       |
//! | ToolFailure        | yes   | observation describing the failure         |
//! | ModelUnavailable   | yes   | same as Decode for the calling stage       |
//! | BudgetExhausted    | no    | forced reflection pass, route to debate    |

use thiserror::Error;

use crate::decode::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFailure {
    /// Model output did not match the expected structured schema.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// External lookup failed or timed out.
    #[error("tool failure: {0}")]
    ToolFailure(String),

    /// Completion service unreachable, timed out or returned nothing usable.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Reflection retries used up. A routing signal, not a fault.
    #[error("budget exhausted ({used}/{max} reflections used)")]
    BudgetExhausted { used: u32, max: u32 },
}

impl StageFailure {
    /// Whether this represents something actually going wrong.
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::BudgetExhausted { .. })
    }

    /// Stable short label for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::ToolFailure(_) => "tool_failure",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::BudgetExhausted { .. } => "budget_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_exhausted_is_not_a_fault() {
        let signal = StageFailure::BudgetExhausted { used: 2, max: 2 };
        assert!(!signal.is_fault());
        assert!(signal.to_string().contains("budget exhausted"));
        assert_eq!(signal.kind(), "budget_exhausted");
    }

    #[test]
    fn test_decode_error_converts() {
        let failure: StageFailure = DecodeError::Empty.into();
        assert!(failure.is_fault());
        assert_eq!(failure.kind(), "decode_error");
        assert!(failure.to_string().contains("empty response"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StageFailure::ToolFailure("timeout after 60s".into()).to_string(),
            "tool failure: timeout after 60s"
        );
        assert_eq!(
            StageFailure::ModelUnavailable("connection refused".into()).to_string(),
            "model unavailable: connection refused"
        );
    }
}
