//! Per-request state threaded through every stage.
//!
//! Stages never mutate [`AgentState`] directly. Each returns a [`StateUpdate`]
//! and the controller merges it with [`AgentState::apply`]: messages are
//! appended, scalar fields are overwritten only when the update carries them.

use serde::{Deserialize, Serialize};

use super::message::{Message, MessageLog, Role};
use crate::debate::DebateOutcome;
use crate::decision::{Decision, FinalAnswer};
use crate::reflection::{ReflectionBudget, ReflectionVerdict, DEFAULT_MAX_REFLECTIONS};

/// Observation prefixes that mark a tool result.
pub const GRAPH_RESULT_PREFIX: &str = "Graph Search Result: ";
pub const WEB_RESULT_PREFIX: &str = "Web Search Result: ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Full conversation so far.
    pub messages: MessageLog,
    /// Reflection visits that found a final answer.
    pub reflection_count: u32,
    /// Evaluated reflection visits allowed before the gate auto-passes.
    pub max_reflections: u32,
    /// Most recent tool output, verbatim.
    pub last_observation: Option<String>,
    /// Verdict of the most recent reflection visit.
    pub last_reflection: Option<ReflectionVerdict>,
    /// Debate result, once the debate stage has run.
    pub debate: Option<DebateOutcome>,
    /// Rendered report, once the debate stage has run.
    pub final_report: Option<String>,
    /// Pending feedback for the reasoning stage.
    pub error: Option<String>,
}

impl AgentState {
    pub fn new(question: impl Into<String>, max_reflections: u32) -> Self {
        let mut messages = MessageLog::new();
        messages.push(Message::user(question));
        Self {
            messages,
            reflection_count: 0,
            max_reflections,
            last_observation: None,
            last_reflection: None,
            debate: None,
            final_report: None,
            error: None,
        }
    }

    /// Fresh state with the default reflection budget.
    pub fn with_question(question: impl Into<String>) -> Self {
        Self::new(question, DEFAULT_MAX_REFLECTIONS)
    }

    /// Merge a stage's partial update.
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(count) = update.reflection_count {
            self.reflection_count = count;
        }
        if let Some(observation) = update.last_observation {
            self.last_observation = Some(observation);
        }
        if let Some(verdict) = update.last_reflection {
            self.last_reflection = Some(verdict);
        }
        if let Some(debate) = update.debate {
            self.debate = Some(debate);
        }
        if let Some(report) = update.final_report {
            self.final_report = Some(report);
        }
        if let Some(error) = update.error {
            self.error = error;
        }
    }

    /// The first user message.
    pub fn question(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Decision carried by the last message, if that message is an assistant turn.
    pub fn last_decision(&self) -> Option<Decision> {
        self.messages.last().and_then(Message::as_decision)
    }

    /// Most recent `final_answer` anywhere in the log.
    pub fn latest_final_answer(&self) -> Option<FinalAnswer> {
        self.messages
            .iter()
            .rev()
            .filter_map(Message::as_decision)
            .find_map(Decision::into_final_answer)
    }

    /// Up to `n` most recent tool observations, oldest first.
    pub fn search_context(&self, n: usize) -> Vec<&str> {
        let mut recent: Vec<&str> = self
            .messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Observation && is_tool_result(&m.content))
            .take(n)
            .map(|m| m.content.as_str())
            .collect();
        recent.reverse();
        recent
    }

    pub fn budget(&self) -> ReflectionBudget {
        ReflectionBudget::new(self.reflection_count, self.max_reflections)
    }
}

fn is_tool_result(content: &str) -> bool {
    content.starts_with(GRAPH_RESULT_PREFIX) || content.starts_with(WEB_RESULT_PREFIX)
}

/// Partial state produced by one stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub reflection_count: Option<u32>,
    pub last_observation: Option<String>,
    pub last_reflection: Option<ReflectionVerdict>,
    pub debate: Option<DebateOutcome>,
    pub final_report: Option<String>,
    /// `Some(None)` clears the pending error, `None` leaves it untouched.
    pub error: Option<Option<String>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_observation(self, text: impl Into<String>) -> Self {
        self.with_message(Message::observation(text))
    }

    pub fn with_last_observation(mut self, text: impl Into<String>) -> Self {
        self.last_observation = Some(text.into());
        self
    }

    pub fn with_reflection(mut self, count: u32, verdict: ReflectionVerdict) -> Self {
        self.reflection_count = Some(count);
        self.last_reflection = Some(verdict);
        self
    }

    pub fn with_debate(mut self, outcome: DebateOutcome, report: String) -> Self {
        self.debate = Some(outcome);
        self.final_report = Some(report);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(Some(error.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }
}
