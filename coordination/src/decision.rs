//! The structured next action chosen by the reasoning stage.
//!
//! Wire format (one JSON object per model turn):
//!
//! ```text
//! {"action": "query_graph",  "query": "..."}
//! {"action": "web_search",   "query": "..."}
//! {"action": "final_answer", "content": "...", "requires_debate": true, "confidence": 0.4}
//! ```

use serde::{Deserialize, Serialize};

use crate::decode::{decode_json, DecodeError};

/// Prefix placed in front of raw model text when decoding fails.
pub const FALLBACK_PREFIX: &str = "Error parsing intent: ";

/// The next action the engine should take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// Ask the knowledge graph.
    QueryGraph { query: String },
    /// Ask the web search service.
    WebSearch { query: String },
    /// Answer the user.
    FinalAnswer {
        content: String,
        requires_debate: bool,
        confidence: f64,
    },
}

impl Decision {
    /// Synthetic answer used whenever the model output cannot be decoded.
    ///
    /// Conservative defaults: debate required, zero confidence.
    pub fn fallback(raw: &str) -> Self {
        Self::FinalAnswer {
            content: format!("{FALLBACK_PREFIX}{raw}"),
            requires_debate: true,
            confidence: 0.0,
        }
    }

    /// Decode model output, falling back to [`Decision::fallback`] on any failure.
    pub fn from_model_output(raw: &str) -> Self {
        Self::decode(raw).unwrap_or_else(|_| Self::fallback(raw))
    }

    /// Decode model output strictly.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        decode_json::<DecisionWire>(raw)?.into_decision()
    }

    /// Canonical JSON encoding stored in assistant messages.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    /// Tool query text, for the two lookup variants.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::QueryGraph { query } | Self::WebSearch { query } => Some(query),
            Self::FinalAnswer { .. } => None,
        }
    }

    pub fn is_final_answer(&self) -> bool {
        matches!(self, Self::FinalAnswer { .. })
    }

    /// Owned view of the `final_answer` payload.
    pub fn into_final_answer(self) -> Option<FinalAnswer> {
        match self {
            Self::FinalAnswer {
                content,
                requires_debate,
                confidence,
            } => Some(FinalAnswer {
                content,
                requires_debate,
                confidence,
            }),
            _ => None,
        }
    }

    /// Short action name for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::QueryGraph { .. } => "query_graph",
            Self::WebSearch { .. } => "web_search",
            Self::FinalAnswer { .. } => "final_answer",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueryGraph { query } => write!(f, "query_graph({})", query),
            Self::WebSearch { query } => write!(f, "web_search({})", query),
            Self::FinalAnswer {
                requires_debate,
                confidence,
                ..
            } => write!(
                f,
                "final_answer(requires_debate={}, confidence={:.2})",
                requires_debate, confidence
            ),
        }
    }
}

/// Payload of a `final_answer` decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub content: String,
    pub requires_debate: bool,
    pub confidence: f64,
}

/// Action tag as the model spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ActionKind {
    QueryGraph,
    WebSearch,
    FinalAnswer,
    #[serde(other)]
    Unknown,
}

/// Lenient wire shape: every payload field optional, validated afterwards.
#[derive(Debug, Deserialize)]
struct DecisionWire {
    action: ActionKind,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    requires_debate: Option<bool>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl DecisionWire {
    fn into_decision(self) -> Result<Decision, DecodeError> {
        match self.action {
            ActionKind::QueryGraph => Ok(Decision::QueryGraph {
                query: non_empty(self.query, "query")?,
            }),
            ActionKind::WebSearch => Ok(Decision::WebSearch {
                query: non_empty(self.query, "query")?,
            }),
            ActionKind::FinalAnswer => Ok(Decision::FinalAnswer {
                content: self
                    .content
                    .ok_or_else(|| DecodeError::Schema("final_answer without content".into()))?,
                requires_debate: self.requires_debate.unwrap_or(true),
                confidence: self
                    .confidence
                    .filter(|c| c.is_finite())
                    .map(|c| c.clamp(0.0, 1.0))
                    .unwrap_or(0.0),
            }),
            ActionKind::Unknown => Err(DecodeError::Schema("unknown action".into())),
        }
    }
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, DecodeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DecodeError::Schema(format!("missing field `{}`", field))),
    }
}
