//! Tool execution stage.
//!
//! Reads the decision in the last assistant message, calls the matching
//! collaborator under a timeout, and records the result as an observation.
//! Failures become observations too; this stage never returns an error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use coordination::state::{GRAPH_RESULT_PREFIX, WEB_RESULT_PREFIX};
use coordination::{AgentState, Decision, StageFailure, StateUpdate};

use super::{GraphQueryService, ToolError, WebSearchService};

pub struct ToolDispatcher {
    graph: Arc<dyn GraphQueryService>,
    web: Arc<dyn WebSearchService>,
    graph_timeout: Duration,
    search_timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(
        graph: Arc<dyn GraphQueryService>,
        web: Arc<dyn WebSearchService>,
        graph_timeout: Duration,
        search_timeout: Duration,
    ) -> Self {
        Self {
            graph,
            web,
            graph_timeout,
            search_timeout,
        }
    }

    pub async fn execute(&self, state: &AgentState) -> StateUpdate {
        let Some(decision) = state.last_decision() else {
            let failure = StageFailure::ToolFailure("no decodable decision to execute".into());
            warn!(kind = failure.kind(), "Tool dispatch without a decision");
            return failed(&failure);
        };

        let (prefix, outcome) = match &decision {
            Decision::QueryGraph { query } => {
                info!(action = decision.action(), %query, "Executing tool");
                (
                    GRAPH_RESULT_PREFIX,
                    bounded("query_graph", self.graph_timeout, self.graph.query(query)).await,
                )
            }
            Decision::WebSearch { query } => {
                info!(action = decision.action(), %query, "Executing tool");
                (
                    WEB_RESULT_PREFIX,
                    bounded("web_search", self.search_timeout, self.web.search(query)).await,
                )
            }
            Decision::FinalAnswer { .. } => return StateUpdate::new(),
        };

        match outcome {
            Ok(result) => StateUpdate::new()
                .with_observation(format!("{prefix}{result}"))
                .with_last_observation(result),
            Err(e) => {
                let failure = StageFailure::from(e);
                warn!(kind = failure.kind(), error = %failure, "Tool execution failed");
                failed(&failure)
            }
        }
    }
}

async fn bounded<F>(tool: &'static str, after: Duration, call: F) -> Result<String, ToolError>
where
    F: Future<Output = Result<String, ToolError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(ToolError::Timeout { tool, after }),
    }
}

fn failed(failure: &StageFailure) -> StateUpdate {
    let text = format!("Tool execution failed: {failure}");
    StateUpdate::new()
        .with_observation(text.clone())
        .with_last_observation(text)
}
