//! Reflection gate: bounded self-critique of a candidate final answer.

use std::sync::Arc;

use tracing::{info, warn};

use coordination::reflection::SKIPPED_OBSERVATION;
use coordination::{AgentState, ReflectionVerdict, StageFailure, StateUpdate};

use super::CallSettings;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompts;

pub struct ReflectionGate {
    model: Arc<dyn LanguageModel>,
    domain: String,
    settings: CallSettings,
}

impl ReflectionGate {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        domain: impl Into<String>,
        settings: CallSettings,
    ) -> Self {
        Self {
            model,
            domain: domain.into(),
            settings,
        }
    }

    /// Evaluate the latest final answer.
    ///
    /// Every visit that finds an answer counts against the budget. Once the
    /// budget is spent the answer passes without a model call. A visit with
    /// no answer records only a skipped observation.
    pub async fn evaluate(&self, state: &AgentState) -> StateUpdate {
        let Some(answer) = state.latest_final_answer() else {
            info!("Reflection skipped: no final answer");
            return StateUpdate::new().with_observation(SKIPPED_OBSERVATION);
        };

        let budget = state.budget();
        let verdict = if budget.is_spent() {
            ReflectionVerdict::exhausted(budget)
        } else {
            let prompt = prompts::reflection_prompt(&self.domain, state, &answer.content);
            let request =
                CompletionRequest::new(prompt, self.settings.temperature, self.settings.timeout);
            match self.model.complete(request).await {
                Ok(raw) => ReflectionVerdict::from_model_output(&raw),
                Err(e) => {
                    let failure = StageFailure::from(e);
                    warn!(kind = failure.kind(), error = %failure, "Reflection model call failed");
                    ReflectionVerdict::proceeding(failure)
                }
            }
        };

        let count = budget.consumed().used;
        info!(
            passed = verdict.passed,
            budget_exhausted = verdict.budget_exhausted,
            reflection_count = count,
            max_reflections = budget.max,
            reason = %verdict.reason,
            "Reflection verdict"
        );

        let update = StateUpdate::new().with_observation(verdict.observation());
        let update = if verdict.passed {
            update.clear_error()
        } else {
            update.with_error(verdict.reason.clone())
        };
        update.with_reflection(count, verdict)
    }
}
