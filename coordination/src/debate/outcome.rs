//! Debate outcome: transcript, scores, key points, and the final assessment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Neutral score used when the judge output cannot be trusted.
pub const NEUTRAL_SCORE: u32 = 50;

/// Score bounds.
pub const MIN_SCORE: u32 = 0;
pub const MAX_SCORE: u32 = 100;

/// Side of the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Bull,
    Bear,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
        }
    }
}

/// Judge's confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown confidence tier: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
    Neutral,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Hold => write!(f, "Hold"),
            Self::Sell => write!(f, "Sell"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "hold" => Ok(Self::Hold),
            "sell" => Ok(Self::Sell),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!("unknown recommendation: {other}")),
        }
    }
}

/// One side's statement in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Round number (1-indexed).
    pub round: u32,
    pub side: Side,
    pub text: String,
}

/// Ordered per-round, per-side statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub entries: Vec<TranscriptEntry>,
    /// Why the debate fell back to the neutral outcome, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl Transcript {
    pub fn push(&mut self, round: u32, side: Side, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            round,
            side,
            text: text.into(),
        });
    }

    /// Distinct round numbers in order of appearance.
    pub fn rounds(&self) -> Vec<u32> {
        let mut rounds: Vec<u32> = Vec::new();
        for entry in &self.entries {
            if !rounds.contains(&entry.round) {
                rounds.push(entry.round);
            }
        }
        rounds
    }

    pub fn statement(&self, round: u32, side: Side) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.round == round && e.side == side)
            .map(|e| e.text.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub bull: u32,
    pub bear: u32,
    /// Always `combined_score(bull, bear)`.
    pub final_score: u32,
    pub confidence: Confidence,
}

impl Scores {
    /// Build scores from side scores, deriving the final score.
    pub fn new(bull: u32, bear: u32, confidence: Confidence) -> Self {
        let bull = bull.min(MAX_SCORE);
        let bear = bear.min(MAX_SCORE);
        Self {
            bull,
            bear,
            final_score: combined_score(bull, bear),
            confidence,
        }
    }
}

/// Equal-weight blend of the two side scores, rounded half away from zero.
pub fn combined_score(bull: u32, bear: u32) -> u32 {
    (0.5 * f64::from(bull) + 0.5 * f64::from(bear)).round() as u32
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoints {
    pub bull: Vec<String>,
    pub bear: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub risk_level: RiskLevel,
    pub recommendation: Recommendation,
}

/// Full result of the debate stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateOutcome {
    pub transcript: Transcript,
    pub scores: Scores,
    pub key_points: KeyPoints,
    pub assessment: Assessment,
    /// Judge's one-paragraph summary.
    #[serde(default)]
    pub summary: String,
}

impl DebateOutcome {
    /// Neutral default: 50/50/50, low confidence, medium risk, Hold.
    pub fn neutral(diagnostic: impl Into<String>) -> Self {
        Self {
            transcript: Transcript {
                entries: Vec::new(),
                diagnostic: Some(diagnostic.into()),
            },
            scores: Scores::new(NEUTRAL_SCORE, NEUTRAL_SCORE, Confidence::Low),
            key_points: KeyPoints {
                bull: vec![String::from("analysis incomplete")],
                bear: vec![String::from("risk assessment incomplete")],
            },
            assessment: Assessment {
                risk_level: RiskLevel::Medium,
                recommendation: Recommendation::Hold,
            },
            summary: String::from("Debate could not be completed; neutral assessment applied."),
        }
    }

    pub fn is_neutral_fallback(&self) -> bool {
        self.transcript.diagnostic.is_some()
    }
}
