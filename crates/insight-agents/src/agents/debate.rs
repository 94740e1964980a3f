use std::sync::Arc;

use tracing::{info, warn};

use coordination::debate::outcome_from_model_output;
use coordination::{render_report, AgentState, DebateBrief, DebateOutcome, StageFailure, StateUpdate};

use super::CallSettings;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompts;

/// Runs the bull/bear/judge debate in one model call and renders the report.
pub struct DebateSynthesizer {
    model: Arc<dyn LanguageModel>,
    domain: String,
    settings: CallSettings,
}

impl DebateSynthesizer {
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

    pub async fn synthesize(&self, state: &AgentState) -> StateUpdate {
        let brief = DebateBrief::from_state(state);
        let prompt = prompts::debate_prompt(&self.domain, &brief);
        let request = CompletionRequest::new(prompt, self.settings.temperature, self.settings.timeout);

        let outcome = match self.model.complete(request).await {
            Ok(raw) => outcome_from_model_output(&raw),
            Err(e) => {
                let failure = StageFailure::from(e);
                warn!(kind = failure.kind(), error = %failure, "Debate model call failed; using neutral outcome");
                DebateOutcome::neutral(failure.to_string())
            }
        };

        let scores = outcome.scores;
        info!(
            bull = scores.bull,
            bear = scores.bear,
            final_score = scores.final_score,
            confidence = %scores.confidence,
            risk_level = %outcome.assessment.risk_level,
            recommendation = %outcome.assessment.recommendation,
            neutral_fallback = outcome.is_neutral_fallback(),
            "Debate scored"
        );

        let report = render_report(&brief.question, &brief.background, &outcome);
        StateUpdate::new()
            .with_observation(format!(
                "Debate complete: final score {}/100, recommendation {}",
                scores.final_score, outcome.assessment.recommendation
            ))
            .with_debate(outcome, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use coordination::debate::{Recommendation, NEUTRAL_SCORE};
    use coordination::{Decision, Message};
    use std::time::Duration;

    struct Fixed(Result<&'static str, ()>);

    #[async_trait]
    impl LanguageModel for Fixed {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            assert_eq!(request.temperature, 0.7);
            self.0
                .map(String::from)
                .map_err(|_| LlmError::Status { status: 500, body: "boom".into() })
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn synthesizer(reply: Result<&'static str, ()>) -> DebateSynthesizer {
        DebateSynthesizer::new(
            Arc::new(Fixed(reply)),
            "semiconductor",
            CallSettings::new(0.7, Duration::from_secs(180)),
        )
    }

    fn state() -> AgentState {
        let mut state = AgentState::with_question("Is ASML a buy?");
        state.apply(StateUpdate::new().with_message(Message::decision(&Decision::FinalAnswer {
            content: "ASML holds an EUV monopoly.".into(),
            requires_debate: true,
            confidence: 0.6,
        })));
        state
    }

    #[tokio::test]
    async fn test_scored_debate_produces_report() {
        let reply = r#"{"rounds":[{"round":1,"bull":"EUV monopoly","bear":"China export limits"},
            {"round":2,"bull":"High-NA ramp","bear":"Cyclical orders"}],
            "judge":{"bull_score":75,"bear_score":55,"final_score":65,"confidence":"medium",
            "summary":"Strong moat, cyclical risk.","key_bull_points":["EUV monopoly"],
            "key_bear_points":["export limits"],"risk_level":"medium","recommendation":"Buy"}}"#;
        let update = synthesizer(Ok(reply)).synthesize(&state()).await;
        let outcome = update.debate.unwrap();
        assert_eq!(outcome.scores.final_score, 65);
        assert_eq!(outcome.assessment.recommendation, Recommendation::Buy);
        let report = update.final_report.unwrap();
        assert!(report.contains("Is ASML a buy?"));
        assert!(report.contains("ASML holds an EUV monopoly."));
        assert!(report.contains("75/100"));
    }

    #[tokio::test]
    async fn test_model_failure_gives_neutral_report() {
        let update = synthesizer(Err(())).synthesize(&state()).await;
        let outcome = update.debate.unwrap();
        assert_eq!(outcome.scores.final_score, NEUTRAL_SCORE);
        assert!(outcome.transcript.diagnostic.unwrap().contains("HTTP 500"));
        assert!(update.final_report.unwrap().contains("Final score: 50/100"));
    }
}
