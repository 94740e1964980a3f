//! Text-to-Cypher graph query service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use coordination::decode::clean_model_output;

use super::neo4j::GraphStore;
use super::{GraphQueryService, ToolError, NO_GRAPH_INFO};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompts;

pub const CYPHER_GENERATION_FAILED: &str = "Failed to generate valid Cypher query.";

/// Translates a question into one Cypher query with the model, then runs it.
pub struct CypherGraphService {
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn GraphStore>,
    temperature: f32,
    timeout: Duration,
}

impl CypherGraphService {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn GraphStore>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            store,
            temperature,
            timeout,
        }
    }

    async fn generate_cypher(&self, question: &str) -> String {
        let request = CompletionRequest::new(
            prompts::cypher_prompt(question),
            self.temperature,
            self.timeout,
        );
        match self.model.complete(request).await {
            Ok(raw) => clean_cypher(&raw),
            Err(e) => {
                warn!(error = %e, "Cypher generation failed");
                String::new()
            }
        }
    }
}

#[async_trait]
impl GraphQueryService for CypherGraphService {
    async fn query(&self, question: &str) -> Result<String, ToolError> {
        let cypher = self.generate_cypher(question).await;
        if cypher.is_empty() {
            return Ok(CYPHER_GENERATION_FAILED.to_string());
        }
        info!(%cypher, "Generated Cypher");

        match self.store.run_cypher(&cypher).await {
            Ok(records) if records.is_empty() => Ok(NO_GRAPH_INFO.to_string()),
            Ok(records) => Ok(serde_json::to_string(&records)
                .unwrap_or_else(|e| format!("Query execution error: {e}"))),
            Err(e) => {
                warn!(error = %e, "Cypher execution failed");
                Ok(format!("Query execution error: {e}"))
            }
        }
    }
}

/// Strip reasoning, fences, and a leading `cypher` label from model output.
pub fn clean_cypher(raw: &str) -> String {
    let cleaned = clean_model_output(raw);
    let body = match cleaned.get(..6) {
        Some(head) if head.eq_ignore_ascii_case("cypher") => &cleaned[6..],
        _ => cleaned.as_str(),
    };
    body.trim_start_matches(':').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::tools::neo4j::{MockGraphStore, Record};
    use std::sync::Mutex;

    /// Model double that returns a fixed completion and records prompts.
    struct FixedModel {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(request.prompt);
            self.reply.clone().map_err(|_| LlmError::EmptyResponse)
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn model(reply: Result<&str, ()>) -> Arc<FixedModel> {
        Arc::new(FixedModel {
            reply: reply.map(String::from),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_clean_cypher_variants() {
        assert_eq!(clean_cypher("MATCH (n) RETURN n"), "MATCH (n) RETURN n");
        assert_eq!(
            clean_cypher("<think>plan</think>```cypher\nMATCH (n) RETURN n\n```"),
            "MATCH (n) RETURN n"
        );
        assert_eq!(clean_cypher("Cypher: MATCH (n) RETURN n"), "MATCH (n) RETURN n");
        assert_eq!(clean_cypher("cypher\nMATCH (n) RETURN n"), "MATCH (n) RETURN n");
        assert_eq!(clean_cypher("<think>nothing</think>"), "");
    }

    #[tokio::test]
    async fn test_rows_rendered_as_json() {
        let mut store = MockGraphStore::new();
        store
            .expect_run_cypher()
            .withf(|c: &str| c.starts_with("MATCH"))
            .returning(|_| Ok(vec![record(&[("Supplier", "SK Hynix")])]));
        let m = model(Ok("MATCH (s)-[:SUPPLIES]->(o) RETURN s.name AS Supplier"));
        let service = CypherGraphService::new(m.clone(), Arc::new(store), 0.0, Duration::from_secs(1));

        let out = service.query("Who supplies NVIDIA?").await.unwrap();
        assert_eq!(out, r#"[{"Supplier":"SK Hynix"}]"#);
        assert!(m.prompts.lock().unwrap()[0].contains("User: Who supplies NVIDIA?"));
    }

    #[tokio::test]
    async fn test_no_rows_is_sentinel() {
        let mut store = MockGraphStore::new();
        store.expect_run_cypher().returning(|_| Ok(Vec::new()));
        let service = CypherGraphService::new(
            model(Ok("MATCH (n) RETURN n")),
            Arc::new(store),
            0.0,
            Duration::from_secs(1),
        );
        assert_eq!(service.query("q").await.unwrap(), NO_GRAPH_INFO);
    }

    #[tokio::test]
    async fn test_generation_failure_skips_execution() {
        let mut store = MockGraphStore::new();
        store.expect_run_cypher().never();
        let service =
            CypherGraphService::new(model(Err(())), Arc::new(store), 0.0, Duration::from_secs(1));
        assert_eq!(service.query("q").await.unwrap(), CYPHER_GENERATION_FAILED);
    }

    #[tokio::test]
    async fn test_execution_error_reported_as_text() {
        let mut store = MockGraphStore::new();
        store
            .expect_run_cypher()
            .returning(|_| Err(ToolError::Query("SyntaxError".into())));
        let service = CypherGraphService::new(
            model(Ok("MATCH (n RETURN n")),
            Arc::new(store),
            0.0,
            Duration::from_secs(1),
        );
        let out = service.query("q").await.unwrap();
        assert!(out.starts_with("Query execution error:"));
        assert!(out.contains("SyntaxError"));
    }
}
