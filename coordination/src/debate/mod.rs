//! Debate synthesis: outcome model, judge decoding, brief, and report.
//!
//! The debate stage makes one model call that covers two argument rounds
//! (bull vs. bear) and the judge's scoring pass. Everything here is pure; the
//! network call lives in the agents crate.

pub mod brief;
pub mod judge;
pub mod outcome;
pub mod report;

pub use brief::{DebateBrief, NO_CONTEXT};
pub use judge::{outcome_from_model_output, parse_debate, MAX_KEY_POINTS};
pub use outcome::{
    combined_score, Assessment, Confidence, DebateOutcome, KeyPoints, Recommendation, RiskLevel,
    Scores, Side, Transcript, TranscriptEntry, NEUTRAL_SCORE,
};
pub use report::{conclusion_for, render_report};
