//! Shared decoder for structured model output.
//!
//! Every stage that expects JSON back from the language model goes through
//! the same pipeline:
//!
//! ```text
//! raw completion
//!   → strip <think>…</think> blocks
//!   → strip surrounding code fences (```json … ``` or ``` … ```)
//!   → fall back to the outermost {…} slice when prose surrounds the object
//!   → serde_json::from_str::<T>
//! ```
//!
//! Callers get a `Result<T, DecodeError>` and pick their own fallback.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a model response could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Nothing left after removing reasoning blocks and fences.
    #[error("empty response after cleanup")]
    Empty,
    /// Text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Syntax(String),
    /// Valid JSON that does not match the expected schema.
    #[error("schema mismatch: {0}")]
    Schema(String),
}

static THINK_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<think>.*?</think>").expect("THINK_BLOCK_RE regex should compile")
});

/// Remove `<think>…</think>` reasoning blocks.
///
/// Some reasoning models emit only the closing tag; everything up to the
/// last `</think>` is dropped in that case.
pub fn strip_think_tags(raw: &str) -> String {
    let without_blocks = THINK_BLOCK_RE.replace_all(raw, "");
    match without_blocks.rfind("</think>") {
        Some(idx) => without_blocks[idx + "</think>".len()..].to_string(),
        None => without_blocks.into_owned(),
    }
}

/// Extract the body of the first fenced block, if any.
///
/// A language tag on the opening fence (`json`, `cypher`, …) is skipped.
/// An unterminated fence yields everything after the opening marker.
pub fn strip_code_fences(text: &str) -> String {
    let Some(open) = text.find("```") else {
        return text.trim().to_string();
    };
    let after_open = &text[open + 3..];
    let tag_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];
    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim().to_string()
}

/// Full cleanup: think tags, then fences, then trim.
pub fn clean_model_output(raw: &str) -> String {
    strip_code_fences(&strip_think_tags(raw))
}

fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Decode a model response into `T`.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, DecodeError> {
    let cleaned = clean_model_output(raw);
    if cleaned.is_empty() {
        return Err(DecodeError::Empty);
    }

    match serde_json::from_str::<T>(&cleaned) {
        Ok(value) => Ok(value),
        Err(first) => {
            // Prose around the object: retry on the outermost braces only.
            if let Some(slice) = outer_object(&cleaned).filter(|s| s.len() < cleaned.len()) {
                if let Ok(value) = serde_json::from_str::<T>(slice) {
                    return Ok(value);
                }
            }
            Err(classify(first))
        }
    }
}

fn classify(err: serde_json::Error) -> DecodeError {
    match err.classify() {
        serde_json::error::Category::Data => DecodeError::Schema(err.to_string()),
        _ => DecodeError::Syntax(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        action: String,
    }

    #[test]
    fn test_strip_think_block() {
        let raw = "<think>let me consider\nthe graph</think>{\"action\": \"x\"}";
        assert_eq!(strip_think_tags(raw), "{\"action\": \"x\"}");
    }

    #[test]
    fn test_strip_dangling_think_close() {
        let raw = "reasoning without an opener</think>\n{\"a\":1}";
        assert_eq!(strip_think_tags(raw).trim(), "{\"a\":1}");
    }

    #[test]
    fn test_strip_json_fence() {
        let text = "Here:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_bare_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_unterminated_fence() {
        let text = "```cypher\nMATCH (n) RETURN n";
        assert_eq!(strip_code_fences(text), "MATCH (n) RETURN n");
    }

    #[test]
    fn test_no_fence_is_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_decode_after_think_and_fence() {
        let raw = "<think>hmm</think>\n```json\n{\"action\": \"query_graph\"}\n```";
        let probe: Probe = decode_json(raw).unwrap();
        assert_eq!(probe.action, "query_graph");
    }

    #[test]
    fn test_decode_with_surrounding_prose() {
        let raw = "Sure! {\"action\": \"web_search\"} hope that helps";
        let probe: Probe = decode_json(raw).unwrap();
        assert_eq!(probe.action, "web_search");
    }

    #[test]
    fn test_decode_empty() {
        let err = decode_json::<Probe>("<think>only thoughts</think>").unwrap_err();
        assert_eq!(err, DecodeError::Empty);
    }

    #[test]
    fn test_decode_syntax_error() {
        let err = decode_json::<Probe>("not json at all").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax(_)));
    }

    #[test]
    fn test_decode_schema_error() {
        let err = decode_json::<Probe>("{\"other\": 1}").unwrap_err();
        assert!(matches!(err, DecodeError::Schema(_)));
    }
}
