//! What the debate argues about: the question and the background answer.

use serde::{Deserialize, Serialize};

use crate::state::AgentState;

/// Search observations used as background when no final answer exists.
pub const CONTEXT_OBSERVATIONS: usize = 3;

pub const NO_CONTEXT: &str = "No specific search context.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateBrief {
    pub question: String,
    pub background: String,
}

impl DebateBrief {
    /// Question is the first user message. Background is the latest final
    /// answer, else the most recent search results, else a placeholder.
    pub fn from_state(state: &AgentState) -> Self {
        let background = match state.latest_final_answer() {
            Some(answer) if !answer.content.trim().is_empty() => answer.content,
            _ => {
                let context = state.search_context(CONTEXT_OBSERVATIONS);
                if context.is_empty() {
                    NO_CONTEXT.to_string()
                } else {
                    context.join("\n\n")
                }
            }
        };
        Self {
            question: state.question().to_string(),
            background,
        }
    }
}
