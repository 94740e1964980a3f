use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use coordination::DEFAULT_MAX_REFLECTIONS;

/// Stage executions allowed per request before the controller stops.
pub const DEFAULT_MAX_STEPS: u32 = 25;

/// OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmEndpoint {
    /// Base URL including the `/v1` suffix.
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl Default for LlmEndpoint {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "http://127.0.0.1:1234/v1".into()),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "qwen/qwen3-14b".into()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "lm-studio".into()),
        }
    }
}

/// Neo4j HTTP API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphEndpoint {
    pub http_url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for GraphEndpoint {
    fn default() -> Self {
        Self {
            http_url: std::env::var("NEO4J_HTTP_URL")
                .unwrap_or_else(|_| "http://localhost:7474".into()),
            database: std::env::var("NEO4J_DATABASE").unwrap_or_else(|_| "neo4j".into()),
            username: std::env::var("NEO4J_USERNAME").unwrap_or_else(|_| "neo4j".into()),
            password: std::env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "password".into()),
        }
    }
}

/// MCP server exposing the `web_search` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchEndpoint {
    pub url: String,
}

impl Default for SearchEndpoint {
    fn default() -> Self {
        Self {
            url: std::env::var("MCP_SEARCH_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".into()),
        }
    }
}

/// Per-stage timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    pub reasoning_secs: u64,
    pub reflection_secs: u64,
    pub debate_secs: u64,
    pub cypher_secs: u64,
    /// Graph execution and web search.
    pub tool_secs: u64,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            reasoning_secs: 300,
            reflection_secs: 120,
            debate_secs: 180,
            cypher_secs: 120,
            tool_secs: 60,
        }
    }
}

impl StageTimeouts {
    pub fn reasoning(&self) -> Duration {
        Duration::from_secs(self.reasoning_secs)
    }

    pub fn reflection(&self) -> Duration {
        Duration::from_secs(self.reflection_secs)
    }

    pub fn debate(&self) -> Duration {
        Duration::from_secs(self.debate_secs)
    }

    pub fn cypher(&self) -> Duration {
        Duration::from_secs(self.cypher_secs)
    }

    pub fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }
}

/// Sampling temperature per stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTemperatures {
    pub reasoning: f32,
    pub reflection: f32,
    pub debate: f32,
    pub cypher: f32,
}

impl Default for StageTemperatures {
    fn default() -> Self {
        Self {
            reasoning: 0.0,
            reflection: 0.0,
            debate: 0.7,
            cypher: 0.0,
        }
    }
}

/// Top-level engine configuration.
///
/// Defaults come from the environment; a TOML file passed with `--config`
/// overrides whatever it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub llm: LlmEndpoint,
    pub graph: GraphEndpoint,
    pub search: SearchEndpoint,
    /// Industry the engine answers questions about.
    pub domain: String,
    /// Evaluated reflection visits before the gate auto-passes.
    pub max_reflections: u32,
    /// Stage executions per request before forced termination.
    pub max_steps: u32,
    pub timeouts: StageTimeouts,
    pub temperatures: StageTemperatures,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            llm: LlmEndpoint::default(),
            graph: GraphEndpoint::default(),
            search: SearchEndpoint::default(),
            domain: std::env::var("INSIGHT_DOMAIN").unwrap_or_else(|_| "semiconductor".into()),
            max_reflections: u32_from_env("INSIGHT_MAX_REFLECTIONS", DEFAULT_MAX_REFLECTIONS),
            max_steps: u32_from_env("INSIGHT_MAX_STEPS", DEFAULT_MAX_STEPS),
            timeouts: StageTimeouts::default(),
            temperatures: StageTemperatures::default(),
        }
    }
}

impl InsightConfig {
    /// Load from a TOML file layered over the environment defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Environment defaults, or the given file when present.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            anyhow::bail!("max_steps must be at least 1");
        }
        if self.llm.base_url.trim().is_empty() {
            anyhow::bail!("llm.base_url must not be empty");
        }
        Ok(())
    }
}

/// Parse a `u32` from the environment, falling back to `default`.
///
/// `INSIGHT_MAX_REFLECTIONS=0` is honored: it disables model-evaluated reflection.
fn u32_from_env(var: &str, default: u32) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

/// Check whether the completion endpoint answers `GET {base}/models`.
pub async fn check_endpoint(url: &str) -> bool {
    let models_url = format!("{}/models", url.trim_end_matches('/'));
    match reqwest::Client::new()
        .get(&models_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = InsightConfig::default();
        assert_eq!(config.timeouts.reasoning(), Duration::from_secs(300));
        assert_eq!(config.timeouts.reflection(), Duration::from_secs(120));
        assert_eq!(config.timeouts.debate(), Duration::from_secs(180));
        assert_eq!(config.timeouts.cypher(), Duration::from_secs(120));
        assert_eq!(config.timeouts.tool(), Duration::from_secs(60));
        assert_eq!(config.temperatures.reasoning, 0.0);
        assert_eq!(config.temperatures.debate, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = InsightConfig::from_toml(
            r#"
            domain = "battery"
            max_reflections = 4

            [timeouts]
            debate_secs = 30

            [llm]
            model = "local-model"
            "#,
        )
        .unwrap();
        assert_eq!(config.domain, "battery");
        assert_eq!(config.max_reflections, 4);
        assert_eq!(config.timeouts.debate_secs, 30);
        assert_eq!(config.timeouts.reasoning_secs, 300);
        assert_eq!(config.llm.model, "local-model");
        assert!(!config.llm.base_url.is_empty());
    }

    #[test]
    fn test_zero_steps_rejected() {
        assert!(InsightConfig::from_toml("max_steps = 0").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insight.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "max_steps = 12").unwrap();

        let config = InsightConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.max_steps, 12);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = InsightConfig::load(Path::new("/nonexistent/insight.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_bad_toml_rejected() {
        assert!(InsightConfig::from_toml("max_steps = \"many\"").is_err());
    }
}
