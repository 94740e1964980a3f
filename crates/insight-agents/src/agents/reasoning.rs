use std::sync::Arc;

use tracing::{info, warn};

use coordination::{AgentState, Decision, Message, StageFailure, StateUpdate};

use super::CallSettings;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompts;

/// Turns the message history into the next [`Decision`].
pub struct ReasoningEngine {
    model: Arc<dyn LanguageModel>,
    domain: String,
    settings: CallSettings,
}

impl ReasoningEngine {
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

    /// One model call. Never fails: undecodable output becomes the fallback answer.
    pub async fn decide(&self, state: &AgentState) -> StateUpdate {
        let prompt = prompts::reasoning_prompt(&self.domain, state);
        let request = CompletionRequest::new(prompt, self.settings.temperature, self.settings.timeout);

        let raw = match self.model.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                let failure = StageFailure::from(e);
                warn!(kind = failure.kind(), error = %failure, "Reasoning model call failed");
                failure.to_string()
            }
        };

        let decision = match Decision::decode(&raw) {
            Ok(decision) => decision,
            Err(e) => {
                let failure = StageFailure::from(e);
                warn!(kind = failure.kind(), error = %failure, "Reasoning output rejected; using fallback answer");
                Decision::fallback(&raw)
            }
        };
        info!(decision = %decision, model = self.model.model_name(), "Reasoning decided");

        let update = StateUpdate::new().with_message(Message::decision(&decision));
        if state.error.is_some() {
            update.clear_error()
        } else {
            update
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use coordination::decision::FALLBACK_PREFIX;
    use std::sync::Mutex;
    use std::time::Duration;

    struct OneShot {
        reply: Mutex<Option<Result<String, LlmError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl OneShot {
        fn new(reply: Result<&str, LlmError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply.map(String::from))),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for OneShot {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request);
            self.reply.lock().unwrap().take().unwrap_or(Err(LlmError::EmptyResponse))
        }

        fn model_name(&self) -> &str {
            "one-shot"
        }
    }

    fn engine(model: Arc<OneShot>) -> ReasoningEngine {
        ReasoningEngine::new(model, "semiconductor", CallSettings::new(0.0, Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn test_decodes_tool_call() {
        let model = OneShot::new(Ok("<think>graph first</think>{\"action\":\"query_graph\",\"query\":\"Who supplies NVIDIA?\"}"));
        let update = engine(model.clone()).decide(&AgentState::with_question("q")).await;
        assert_eq!(update.messages.len(), 1);
        assert_eq!(
            update.messages[0].as_decision(),
            Some(Decision::QueryGraph {
                query: "Who supplies NVIDIA?".into()
            })
        );
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.0);
        assert_eq!(seen[0].timeout, Duration::from_secs(300));
        assert_eq!(update.error, None);
    }

    #[tokio::test]
    async fn test_garbage_becomes_fallback() {
        let model = OneShot::new(Ok("I think NVIDIA is great"));
        let update = engine(model).decide(&AgentState::with_question("q")).await;
        match update.messages[0].as_decision() {
            Some(Decision::FinalAnswer { content, requires_debate, confidence }) => {
                assert_eq!(content, format!("{FALLBACK_PREFIX}I think NVIDIA is great"));
                assert!(requires_debate);
                assert_eq!(confidence, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_failure_becomes_fallback() {
        let model = OneShot::new(Err(LlmError::Connection("refused".into())));
        let update = engine(model).decide(&AgentState::with_question("q")).await;
        let decision = update.messages[0].as_decision().unwrap();
        assert!(decision.is_final_answer());
        assert!(update.messages[0].content.contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_pending_error_is_cleared_and_shown() {
        let model = OneShot::new(Ok(r#"{"action":"web_search","query":"HBM pricing"}"#));
        let mut state = AgentState::with_question("q");
        state.apply(StateUpdate::new().with_error("unsupported pricing claim"));

        let update = engine(model.clone()).decide(&state).await;
        assert_eq!(update.error, Some(None));
        assert!(model.seen.lock().unwrap()[0].prompt.contains("unsupported pricing claim"));
    }
}
