//! Request lifecycle: drives the stages through the controller state machine.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use coordination::{AgentState, StateUpdate};

use crate::agents::{CallSettings, DebateSynthesizer, ReasoningEngine, ReflectionGate};
use crate::config::InsightConfig;
use crate::llm::{LanguageModel, OpenAiCompatClient};
use crate::prompts::PROMPT_VERSION;
use crate::state_machine::{
    route_after_reasoning, route_after_reflection, Phase, StateMachine, TransitionRecord,
};
use crate::tools::{
    CypherGraphService, GraphQueryService, McpWebSearch, Neo4jHttpClient, ToolDispatcher,
    WebSearchService,
};

/// Text shown when a run ends without any answer.
pub const NO_ANSWER: &str = "No answer produced.";

/// Shared, thread-safe collaborators injected into every stage.
#[derive(Clone)]
pub struct Collaborators {
    pub model: Arc<dyn LanguageModel>,
    pub graph: Arc<dyn GraphQueryService>,
    pub web: Arc<dyn WebSearchService>,
}

impl Collaborators {
    /// Production wiring: OpenAI-compatible model, Neo4j text-to-Cypher, MCP search.
    pub fn from_config(config: &InsightConfig) -> Result<Self> {
        let model: Arc<dyn LanguageModel> = Arc::new(
            OpenAiCompatClient::new(&config.llm).context("Failed to build model client")?,
        );
        let store = Arc::new(
            Neo4jHttpClient::new(&config.graph).context("Failed to build Neo4j client")?,
        );
        let graph = Arc::new(CypherGraphService::new(
            model.clone(),
            store,
            config.temperatures.cypher,
            config.timeouts.cypher(),
        ));
        let web = Arc::new(
            McpWebSearch::new(&config.search, config.timeouts.tool())
                .context("Failed to build MCP search client")?,
        );
        Ok(Self { model, graph, web })
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub request_id: Uuid,
    pub state: AgentState,
    pub transitions: Vec<TransitionRecord>,
    /// Stage executions performed.
    pub steps: u32,
    pub hit_step_limit: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Whether the debate stage ran.
    pub fn debated(&self) -> bool {
        self.state.debate.is_some()
    }

    /// Phases entered after the initial `Reasoning`, in order.
    pub fn phases(&self) -> Vec<Phase> {
        self.transitions.iter().map(|t| t.to).collect()
    }

    /// The report when a debate ran, otherwise the direct answer.
    pub fn answer_text(&self) -> String {
        if let Some(report) = &self.state.final_report {
            return report.clone();
        }
        self.state
            .latest_final_answer()
            .map(|a| a.content)
            .unwrap_or_else(|| NO_ANSWER.to_string())
    }
}

pub struct Orchestrator {
    reasoning: ReasoningEngine,
    dispatcher: ToolDispatcher,
    reflection: ReflectionGate,
    debate: DebateSynthesizer,
    max_reflections: u32,
    max_steps: u32,
}

impl Orchestrator {
    pub fn new(config: &InsightConfig, collaborators: Collaborators) -> Self {
        let Collaborators { model, graph, web } = collaborators;
        let timeouts = &config.timeouts;
        let temps = &config.temperatures;
        Self {
            reasoning: ReasoningEngine::new(
                model.clone(),
                &config.domain,
                CallSettings::new(temps.reasoning, timeouts.reasoning()),
            ),
            // Graph lookups include Cypher generation, so they get both budgets.
            dispatcher: ToolDispatcher::new(
                graph,
                web,
                timeouts.cypher() + timeouts.tool(),
                timeouts.tool(),
            ),
            reflection: ReflectionGate::new(
                model.clone(),
                &config.domain,
                CallSettings::new(temps.reflection, timeouts.reflection()),
            ),
            debate: DebateSynthesizer::new(
                model,
                &config.domain,
                CallSettings::new(temps.debate, timeouts.debate()),
            ),
            max_reflections: config.max_reflections,
            max_steps: config.max_steps.max(1),
        }
    }

    pub fn from_config(config: &InsightConfig) -> Result<Self> {
        Ok(Self::new(config, Collaborators::from_config(config)?))
    }

    /// Run one request from a fresh state.
    pub async fn run(&self, question: &str) -> RunOutcome {
        let request_id = Uuid::new_v4();
        let span = info_span!("insight_run", %request_id);
        self.run_inner(request_id, question).instrument(span).await
    }

    /// Run independent requests concurrently. Results keep input order.
    pub async fn run_many(&self, questions: &[String]) -> Vec<RunOutcome> {
        join_all(questions.iter().map(|q| self.run(q))).await
    }

    async fn run_inner(&self, request_id: Uuid, question: &str) -> RunOutcome {
        let started_at = Utc::now();
        let mut state = AgentState::new(question, self.max_reflections);
        let mut sm = StateMachine::new();
        let mut hit_step_limit = false;

        info!(
            %question,
            max_reflections = self.max_reflections,
            max_steps = self.max_steps,
            prompt_version = PROMPT_VERSION,
            "Run started"
        );

        while !sm.is_terminal() {
            if sm.step() >= self.max_steps {
                warn!(steps = sm.step(), "Step limit reached; ending run");
                state.apply(StateUpdate::new().with_observation(format!(
                    "Step limit reached after {} stage executions; stopping.",
                    sm.step()
                )));
                hit_step_limit = true;
                self.transition(&mut sm, Phase::End, "step limit reached".into());
                break;
            }

            let (next, reason) = match sm.current() {
                Phase::Reasoning => {
                    let update = self.reasoning.decide(&state).await;
                    state.apply(update);
                    route_after_reasoning(state.last_decision().as_ref())
                }
                Phase::ToolExecution => {
                    let update = self.dispatcher.execute(&state).await;
                    state.apply(update);
                    (Phase::Reasoning, "tool result recorded".to_string())
                }
                Phase::Reflection => {
                    let update = self.reflection.evaluate(&state).await;
                    let verdict = update.last_reflection.clone();
                    state.apply(update);
                    let answer = state.latest_final_answer();
                    route_after_reflection(verdict.as_ref(), state.budget(), answer.as_ref())
                }
                Phase::Debate => {
                    let update = self.debate.synthesize(&state).await;
                    state.apply(update);
                    (Phase::End, "debate complete".to_string())
                }
                Phase::End => break,
            };
            sm.record_step();
            self.transition(&mut sm, next, reason);
        }

        info!(
            path = %sm.summary(),
            reflection_count = state.reflection_count,
            debated = state.debate.is_some(),
            "Run finished"
        );

        RunOutcome {
            request_id,
            steps: sm.step(),
            transitions: sm.into_transitions(),
            state,
            hit_step_limit,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn transition(&self, sm: &mut StateMachine, to: Phase, reason: String) {
        info!(from = %sm.current(), %to, %reason, "Routing");
        if let Err(e) = sm.advance(to, reason) {
            warn!(error = %e, "Rejected transition; ending run");
            // Ending is legal from every non-terminal phase.
            let _ = sm.advance(Phase::End, e.to_string());
        }
    }
}
