//! Decoding the consolidated debate response.
//!
//! The model returns both argument rounds and the judge's scoring in a single
//! JSON object. Scores are clamped to [0, 100] and rounded, and the final score
//! is always recomputed here. Anything that does not fit the contract yields
//! the neutral outcome.

use serde::Deserialize;
use tracing::{debug, warn};

use super::outcome::{
    Assessment, Confidence, DebateOutcome, KeyPoints, Recommendation, RiskLevel, Scores, Side,
    Transcript, MAX_SCORE, MIN_SCORE,
};
use crate::decode::{decode_json, DecodeError};
use crate::error::StageFailure;

/// Key points kept per side.
pub const MAX_KEY_POINTS: usize = 5;

#[derive(Debug, Deserialize)]
struct DebateWire {
    #[serde(default)]
    rounds: Vec<RoundWire>,
    judge: JudgeWire,
}

#[derive(Debug, Deserialize)]
struct RoundWire {
    #[serde(default)]
    round: Option<u32>,
    #[serde(default)]
    bull: String,
    #[serde(default)]
    bear: String,
}

#[derive(Debug, Deserialize)]
struct JudgeWire {
    bull_score: f64,
    bear_score: f64,
    #[serde(default)]
    final_score: Option<f64>,
    confidence: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_bull_points: Vec<String>,
    #[serde(default)]
    key_bear_points: Vec<String>,
    risk_level: String,
    recommendation: String,
}

/// Decode a debate response strictly.
pub fn parse_debate(raw: &str) -> Result<DebateOutcome, DecodeError> {
    let wire: DebateWire = decode_json(raw)?;

    let mut transcript = Transcript::default();
    for (idx, round) in wire.rounds.into_iter().enumerate() {
        let number = round.round.unwrap_or(idx as u32 + 1);
        if !round.bull.trim().is_empty() {
            transcript.push(number, Side::Bull, round.bull.trim());
        }
        if !round.bear.trim().is_empty() {
            transcript.push(number, Side::Bear, round.bear.trim());
        }
    }

    let judge = wire.judge;
    let confidence: Confidence = judge.confidence.parse().map_err(DecodeError::Schema)?;
    let risk_level: RiskLevel = judge.risk_level.parse().map_err(DecodeError::Schema)?;
    let recommendation: Recommendation =
        judge.recommendation.parse().map_err(DecodeError::Schema)?;

    let scores = Scores::new(
        normalize_score(judge.bull_score, "bull_score")?,
        normalize_score(judge.bear_score, "bear_score")?,
        confidence,
    );
    if let Some(claimed) = judge.final_score {
        if claimed.round() != f64::from(scores.final_score) {
            debug!(
                claimed,
                computed = scores.final_score,
                "Judge final_score disagrees with computed blend; using computed"
            );
        }
    }

    Ok(DebateOutcome {
        transcript,
        scores,
        key_points: KeyPoints {
            bull: tidy_points(judge.key_bull_points),
            bear: tidy_points(judge.key_bear_points),
        },
        assessment: Assessment {
            risk_level,
            recommendation,
        },
        summary: judge.summary.trim().to_string(),
    })
}

/// Decode a debate response, substituting the neutral outcome on failure.
pub fn outcome_from_model_output(raw: &str) -> DebateOutcome {
    match parse_debate(raw) {
        Ok(outcome) => outcome,
        Err(e) => {
            let failure = StageFailure::from(e);
            warn!(kind = failure.kind(), error = %failure, "Debate output rejected; using neutral outcome");
            DebateOutcome::neutral(failure.to_string())
        }
    }
}

fn normalize_score(value: f64, field: &str) -> Result<u32, DecodeError> {
    if !value.is_finite() {
        return Err(DecodeError::Schema(format!("`{field}` is not a finite number")));
    }
    let clamped = value.round().clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE));
    Ok(clamped as u32)
}

fn tidy_points(points: Vec<String>) -> Vec<String> {
    points
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_KEY_POINTS)
        .collect()
}
