//! External lookup collaborators and the stage that dispatches to them.
//!
//! - [`GraphQueryService`]: natural-language question in, graph facts out
//!   ([`cypher::CypherGraphService`] over [`neo4j::Neo4jHttpClient`])
//! - [`WebSearchService`]: query in, truncated result text out
//!   ([`web_search::McpWebSearch`])
//! - [`dispatcher::ToolDispatcher`]: runs the lookup named by the last decision

pub mod cypher;
pub mod dispatcher;
pub mod neo4j;
pub mod web_search;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use coordination::StageFailure;

pub use cypher::CypherGraphService;
pub use dispatcher::ToolDispatcher;
pub use neo4j::{GraphStore, Neo4jHttpClient, Record};
pub use web_search::{truncate_results, McpWebSearch};

/// Sentinel returned when the graph has no matching facts.
pub const NO_GRAPH_INFO: &str = "No information found in the knowledge graph.";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: &'static str, after: Duration },

    #[error("request failed: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response arrived but did not follow the expected protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The backend rejected the query itself.
    #[error("query rejected: {0}")]
    Query(String),
}

impl From<ToolError> for StageFailure {
    fn from(err: ToolError) -> Self {
        StageFailure::ToolFailure(err.to_string())
    }
}

/// Answers natural-language questions from the knowledge graph.
///
/// Backend failures are reported as text in `Ok`; `Err` is for failures the
/// service could not describe itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphQueryService: Send + Sync {
    async fn query(&self, question: &str) -> Result<String, ToolError>;
}

/// Searches the web for current information.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearchService: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, ToolError>;
}
