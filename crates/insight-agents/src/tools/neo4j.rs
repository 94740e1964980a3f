//! Minimal Neo4j client over the HTTP transactional endpoint.
//!
//! `POST {url}/db/{database}/tx/commit` with one statement per request and
//! basic auth. Rows come back as `{"columns": [...], "data": [{"row": [...]}]}`
//! and are zipped into column → value records.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::ToolError;
use crate::config::GraphEndpoint;

/// One result row keyed by column name.
pub type Record = Map<String, Value>;

/// Executes Cypher against a graph database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run_cypher(&self, cypher: &str) -> Result<Vec<Record>, ToolError>;
}

pub struct Neo4jHttpClient {
    commit_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl Neo4jHttpClient {
    pub fn new(endpoint: &GraphEndpoint) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        Ok(Self {
            commit_url: format!(
                "{}/db/{}/tx/commit",
                endpoint.http_url.trim_end_matches('/'),
                endpoint.database
            ),
            username: endpoint.username.clone(),
            password: endpoint.password.clone(),
            client,
        })
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpClient {
    async fn run_cypher(&self, cypher: &str) -> Result<Vec<Record>, ToolError> {
        let body = serde_json::json!({
            "statements": [{"statement": cypher}]
        });
        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Status { status, body });
        }

        let parsed: CommitResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Protocol(e.to_string()))?;
        parsed.into_records()
    }
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

impl CommitResponse {
    fn into_records(self) -> Result<Vec<Record>, ToolError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(ToolError::Query(format!("{}: {}", err.code, err.message)));
        }
        let Some(result) = self.results.into_iter().next() else {
            return Ok(Vec::new());
        };
        let columns = result.columns;
        Ok(result
            .data
            .into_iter()
            .map(|d| columns.iter().cloned().zip(d.row).collect::<Record>())
            .collect())
    }
}
