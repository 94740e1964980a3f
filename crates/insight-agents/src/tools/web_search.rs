//! Web search through an MCP server's `web_search` tool.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{ToolError, WebSearchService};
use crate::config::SearchEndpoint;

/// Characters of search output kept before truncation.
pub const MAX_RESULT_CHARS: usize = 3000;
pub const TRUNCATION_MARKER: &str = "\n\n[Results truncated]";

/// Normalise raw search output: placeholder when empty, capped when long.
pub fn truncate_results(query: &str, raw: &str) -> String {
    if raw.trim().is_empty() {
        return format!("No results found for: {query}");
    }
    match raw.char_indices().nth(MAX_RESULT_CHARS) {
        Some((cut, _)) => format!("{}{}", &raw[..cut], TRUNCATION_MARKER),
        None => raw.to_string(),
    }
}

/// JSON-RPC 2.0 client for `tools/call` on `{url}/mcp`.
pub struct McpWebSearch {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl McpWebSearch {
    pub fn new(search: &SearchEndpoint, timeout: Duration) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        Ok(Self {
            endpoint: format!("{}/mcp", search.url.trim_end_matches('/')),
            timeout,
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<ToolResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ToolResult {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(default)]
    text: Option<String>,
}

impl RpcResponse {
    fn into_text(self) -> Result<String, ToolError> {
        if let Some(err) = self.error {
            return Err(ToolError::Protocol(format!("MCP error: {err}")));
        }
        let result = self
            .result
            .ok_or_else(|| ToolError::Protocol("response has neither result nor error".into()))?;
        Ok(result
            .content
            .into_iter()
            .next()
            .and_then(|c| c.text)
            .unwrap_or_default())
    }
}

#[async_trait]
impl WebSearchService for McpWebSearch {
    async fn search(&self, query: &str) -> Result<String, ToolError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "web_search", "arguments": {"query": query}},
        });
        info!(endpoint = %self.endpoint, %query, "Calling MCP web_search");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool: "web_search",
                        after: self.timeout,
                    }
                } else {
                    ToolError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Status { status, body });
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Protocol(e.to_string()))?;
        let text = parsed.into_text()?;
        info!(chars = text.len(), "MCP web_search returned");
        Ok(truncate_results(query, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_results_placeholder() {
        assert_eq!(truncate_results("HBM4", "  \n"), "No results found for: HBM4");
    }

    #[test]
    fn test_short_results_untouched() {
        assert_eq!(truncate_results("q", "TSMC 2nm ramps in 2025"), "TSMC 2nm ramps in 2025");
    }

    #[test]
    fn test_long_results_truncated_at_char_boundary() {
        let raw = "晶".repeat(MAX_RESULT_CHARS + 10);
        let out = truncate_results("q", &raw);
        assert!(out.ends_with(TRUNCATION_MARKER));
        let kept = out.trim_end_matches(TRUNCATION_MARKER);
        assert_eq!(kept.chars().count(), MAX_RESULT_CHARS);
    }

    #[test]
    fn test_exactly_limit_not_truncated() {
        let raw = "a".repeat(MAX_RESULT_CHARS);
        assert_eq!(truncate_results("q", &raw), raw);
    }

    #[test]
    fn test_rpc_result_text() {
        let parsed: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"result":{"content":[{"type":"text","text":"hits"}]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().unwrap(), "hits");
    }

    #[test]
    fn test_rpc_error() {
        let parsed: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        let err = parsed.into_text().unwrap_err();
        assert!(err.to_string().contains("Method not found"));
    }

    #[test]
    fn test_endpoint_path() {
        let search = McpWebSearch::new(
            &SearchEndpoint {
                url: "http://localhost:8000/".into(),
            },
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(search.endpoint, "http://localhost:8000/mcp");
    }
}
