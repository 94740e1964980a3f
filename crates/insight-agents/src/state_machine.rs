//! Controller state machine: phases, legal transitions, and routing.
//!
//! Every request starts in `Reasoning` and terminates in `End`. The routing
//! functions below are the only place that decides where a request goes next;
//! [`StateMachine::advance`] then checks the move against the legal-edge table
//! and records it.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coordination::{Decision, FinalAnswer, ReflectionBudget, ReflectionVerdict};

/// Answers above this confidence that do not ask for a debate end directly.
pub const DIRECT_ANSWER_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Choosing the next action.
    Reasoning,
    /// Running a graph or web lookup.
    ToolExecution,
    /// Quality-checking a candidate answer.
    Reflection,
    /// Bull/bear debate and report.
    Debate,
    /// Terminal.
    End,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reasoning => write!(f, "reasoning"),
            Self::ToolExecution => write!(f, "tool_execution"),
            Self::Reflection => write!(f, "reflection"),
            Self::Debate => write!(f, "debate"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Legal edges:
/// ```text
/// Reasoning     → ToolExecution | Reflection | End
/// ToolExecution → Reasoning
/// Reflection    → Reasoning | Debate | End
/// Debate        → End
/// ```
/// Any non-terminal phase may also go to `End` (step limit).
fn is_legal_transition(from: Phase, to: Phase) -> bool {
    use Phase::*;

    if to == End && !from.is_terminal() {
        return true;
    }

    matches!(
        (from, to),
        (Reasoning, ToolExecution)
            | (Reasoning, Reflection)
            | (ToolExecution, Reasoning)
            | (Reflection, Reasoning)
            | (Reflection, Debate)
    )
}

/// A single recorded transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: Phase,
    pub to: Phase,
    /// Stage executions completed when the transition happened.
    pub step: u32,
    /// Milliseconds since the run started.
    pub elapsed_ms: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal phase transition: {from} → {to}")]
pub struct IllegalTransition {
    pub from: Phase,
    pub to: Phase,
}

/// Tracks the current phase and the transition log of one request.
pub struct StateMachine {
    current: Phase,
    step: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: Phase::Reasoning,
            step: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Count one completed stage execution.
    pub fn record_step(&mut self) {
        self.step += 1;
    }

    pub fn advance(&mut self, to: Phase, reason: impl Into<String>) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            step: self.step,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.into(),
        };

        tracing::debug!(
            from = %self.current,
            to = %to,
            step = self.step,
            reason = %record.reason,
            "Phase transition"
        );

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }

    /// Visited phases in order, e.g. `reasoning → tool_execution → ... → end`.
    pub fn summary(&self) -> String {
        let mut phases = vec![Phase::Reasoning.to_string()];
        phases.extend(self.transitions.iter().map(|t| t.to.to_string()));
        format!(
            "{} ({} steps, {}ms)",
            phases.join(" → "),
            self.step,
            self.created_at.elapsed().as_millis()
        )
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Where to go after the reasoning stage.
pub fn route_after_reasoning(decision: Option<&Decision>) -> (Phase, String) {
    match decision {
        Some(d @ (Decision::QueryGraph { .. } | Decision::WebSearch { .. })) => {
            (Phase::ToolExecution, format!("{} requested", d.action()))
        }
        Some(Decision::FinalAnswer { .. }) => (Phase::Reflection, "final answer proposed".into()),
        None => (Phase::End, "no decodable decision".into()),
    }
}

/// Where to go after a reflection visit.
///
/// `verdict` is `None` when the visit was skipped. `budget` is the counter
/// after the visit. `answer` is the answer that was evaluated.
pub fn route_after_reflection(
    verdict: Option<&ReflectionVerdict>,
    budget: ReflectionBudget,
    answer: Option<&FinalAnswer>,
) -> (Phase, String) {
    let Some(verdict) = verdict else {
        return (Phase::End, "reflection skipped: no final answer".into());
    };

    if verdict.budget_exhausted {
        return (Phase::Debate, format!("budget exhausted ({budget}), forcing debate"));
    }

    if !verdict.passed {
        return if budget.allows_retry() {
            (Phase::Reasoning, format!("reflection failed ({budget}), retrying"))
        } else {
            (Phase::Debate, format!("reflection failed with budget exhausted ({budget})"))
        };
    }

    match answer {
        Some(a) if !a.requires_debate && a.confidence > DIRECT_ANSWER_CONFIDENCE => (
            Phase::End,
            format!("confident answer ({:.2}), debate skipped", a.confidence),
        ),
        Some(a) => (
            Phase::Debate,
            format!(
                "debate needed (requires_debate={}, confidence={:.2})",
                a.requires_debate, a.confidence
            ),
        ),
        None => (Phase::Debate, "reflection passed".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(requires_debate: bool, confidence: f64) -> FinalAnswer {
        FinalAnswer {
            content: "a".into(),
            requires_debate,
            confidence,
        }
    }

    #[test]
    fn test_initial_state() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), Phase::Reasoning);
        assert!(!sm.is_terminal());
        assert!(sm.transitions().is_empty());
    }

    #[test]
    fn test_direct_answer_path() {
        let mut sm = StateMachine::new();
        sm.advance(Phase::ToolExecution, "query_graph requested").unwrap();
        sm.advance(Phase::Reasoning, "tool done").unwrap();
        sm.advance(Phase::Reflection, "final answer proposed").unwrap();
        sm.advance(Phase::End, "confident answer").unwrap();
        assert!(sm.is_terminal());
        assert_eq!(sm.transitions().len(), 4);
        assert!(sm.summary().starts_with("reasoning → tool_execution → reasoning → reflection → end"));
    }

    #[test]
    fn test_reflection_retry_loop_then_debate() {
        let mut sm = StateMachine::new();
        sm.advance(Phase::Reflection, "").unwrap();
        sm.advance(Phase::Reasoning, "failed").unwrap();
        sm.advance(Phase::Reflection, "").unwrap();
        sm.advance(Phase::Debate, "forced").unwrap();
        sm.advance(Phase::End, "done").unwrap();
        assert!(sm.is_terminal());
    }

    #[test]
    fn test_end_from_any_non_terminal() {
        for phase in [Phase::Reasoning, Phase::ToolExecution, Phase::Reflection, Phase::Debate] {
            let mut sm = StateMachine {
                current: phase,
                step: 25,
                created_at: Instant::now(),
                transitions: Vec::new(),
            };
            assert!(sm.advance(Phase::End, "step limit").is_ok());
            assert!(sm.is_terminal());
        }
    }

    #[test]
    fn test_illegal_transitions() {
        let mut sm = StateMachine::new();
        let err = sm.advance(Phase::Debate, "skip ahead").unwrap_err();
        assert_eq!(err.from, Phase::Reasoning);
        assert_eq!(err.to, Phase::Debate);

        sm.advance(Phase::ToolExecution, "").unwrap();
        assert!(sm.advance(Phase::Reflection, "").is_err());

        sm.advance(Phase::End, "").unwrap();
        assert!(sm.advance(Phase::Reasoning, "").is_err());
        assert!(sm.advance(Phase::End, "").is_err());
    }

    #[test]
    fn test_record_carries_step_and_reason() {
        let mut sm = StateMachine::new();
        sm.record_step();
        sm.advance(Phase::ToolExecution, "web_search requested").unwrap();
        let record = &sm.transitions()[0];
        assert_eq!(record.step, 1);
        assert_eq!(record.reason, "web_search requested");

        let json = serde_json::to_string(record).unwrap();
        assert!(json.contains("\"to\":\"tool_execution\""));
    }

    #[test]
    fn test_route_after_reasoning() {
        let q = Decision::WebSearch { query: "q".into() };
        assert_eq!(route_after_reasoning(Some(&q)).0, Phase::ToolExecution);
        let f = Decision::fallback("junk");
        assert_eq!(route_after_reasoning(Some(&f)).0, Phase::Reflection);
        assert_eq!(route_after_reasoning(None).0, Phase::End);
    }

    #[test]
    fn test_route_after_reflection_table() {
        let pass = ReflectionVerdict::pass("ok");
        let fail = ReflectionVerdict::fail("weak");
        let forced = ReflectionVerdict::exhausted(ReflectionBudget::new(2, 2));

        // Skipped visit.
        assert_eq!(route_after_reflection(None, ReflectionBudget::new(0, 2), None).0, Phase::End);

        // FAIL with budget remaining, including the boundary used == max.
        assert_eq!(
            route_after_reflection(Some(&fail), ReflectionBudget::new(1, 2), None).0,
            Phase::Reasoning
        );
        assert_eq!(
            route_after_reflection(Some(&fail), ReflectionBudget::new(2, 2), None).0,
            Phase::Reasoning
        );
        // FAIL beyond the budget.
        assert_eq!(
            route_after_reflection(Some(&fail), ReflectionBudget::new(3, 2), None).0,
            Phase::Debate
        );
        // Forced pass always debates, even for a confident answer.
        let confident = answer(false, 0.95);
        assert_eq!(
            route_after_reflection(Some(&forced), ReflectionBudget::new(3, 2), Some(&confident)).0,
            Phase::Debate
        );
        // PASS: confident and no debate requested ends directly.
        assert_eq!(
            route_after_reflection(Some(&pass), ReflectionBudget::new(1, 2), Some(&confident)).0,
            Phase::End
        );
        // PASS at exactly 0.9 still debates.
        assert_eq!(
            route_after_reflection(Some(&pass), ReflectionBudget::new(1, 2), Some(&answer(false, 0.9))).0,
            Phase::Debate
        );
        // PASS with requires_debate debates regardless of confidence.
        assert_eq!(
            route_after_reflection(Some(&pass), ReflectionBudget::new(1, 2), Some(&answer(true, 0.99))).0,
            Phase::Debate
        );
    }
}
