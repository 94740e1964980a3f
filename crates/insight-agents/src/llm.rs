//! Language model collaborator.
//!
//! Stages talk to the model through [`LanguageModel`]; the production
//! implementation is [`OpenAiCompatClient`], which speaks the OpenAI chat
//! completions protocol (LM Studio, vLLM, llama.cpp server, ...).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use coordination::StageFailure;

use crate::config::LlmEndpoint;

/// One prompt-in, text-out call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            timeout,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("empty completion")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<LlmError> for StageFailure {
    fn from(err: LlmError) -> Self {
        StageFailure::ModelUnavailable(err.to_string())
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one completion and return the raw text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(endpoint: &LlmEndpoint) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;
        Ok(Self {
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            model: endpoint.model.clone(),
            api_key: endpoint.api_key.clone(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiCompatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
        });

        let start = std::time::Instant::now();
        let send = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .timeout(request.timeout)
            .send();

        let response = match tokio::time::timeout(request.timeout, send).await {
            Err(_) => return Err(LlmError::Timeout(request.timeout)),
            Ok(Err(e)) if e.is_timeout() => return Err(LlmError::Timeout(request.timeout)),
            Ok(Err(e)) => return Err(LlmError::Connection(e.to_string())),
            Ok(Ok(resp)) => resp,
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Completion received"
        );

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_maps_to_model_unavailable() {
        let failure: StageFailure = LlmError::Timeout(Duration::from_secs(300)).into();
        assert_eq!(failure.kind(), "model_unavailable");
        assert!(failure.to_string().contains("timed out"));

        let failure: StageFailure = LlmError::Status {
            status: 503,
            body: "loading model".into(),
        }
        .into();
        assert!(failure.to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_chat_response_shape() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.choices.is_empty());
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = OpenAiCompatClient::new(&LlmEndpoint {
            base_url: "http://localhost:1234/v1/".into(),
            model: "m".into(),
            api_key: "k".into(),
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/v1");
        assert_eq!(client.model_name(), "m");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let client = OpenAiCompatClient::new(&LlmEndpoint {
            base_url: "http://127.0.0.1:9/v1".into(),
            model: "m".into(),
            api_key: "k".into(),
        })
        .unwrap();
        let err = client
            .complete(CompletionRequest::new("hi", 0.0, Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Connection(_) | LlmError::Timeout(_)));
    }
}
