//! Final report rendering. Pure: same inputs, same text.

use super::judge::MAX_KEY_POINTS;
use super::outcome::{DebateOutcome, Side};

pub const REPORT_TITLE: &str = "# Industry Insight Report";
pub const HEADING_QUESTION: &str = "## 1. Question Recap";
pub const HEADING_BACKGROUND: &str = "## 2. Background Analysis";
pub const HEADING_SCORING: &str = "## 3. Debate Scoring";
pub const HEADING_CONCLUSION: &str = "## 4. Conclusion";

/// Final score at or above which the outlook is positive.
pub const POSITIVE_THRESHOLD: u32 = 70;
/// Final score at or above which the outlook is cautious rather than negative.
pub const CAUTIOUS_THRESHOLD: u32 = 50;

pub const POSITIVE_CONCLUSION: &str =
    "Overall the fundamentals look solid and the position is strong; worth active attention.";
pub const CAUTIOUS_CONCLUSION: &str =
    "Overall there are real strengths alongside material risks; a cautious wait-and-see stance is advised.";
pub const NEGATIVE_CONCLUSION: &str =
    "Overall the outlook carries significant uncertainty; avoiding or reducing exposure is advised.";

/// Conclusion band for a final score.
pub fn conclusion_for(final_score: u32) -> &'static str {
    if final_score >= POSITIVE_THRESHOLD {
        POSITIVE_CONCLUSION
    } else if final_score >= CAUTIOUS_THRESHOLD {
        CAUTIOUS_CONCLUSION
    } else {
        NEGATIVE_CONCLUSION
    }
}

/// Render the report for a finished debate.
pub fn render_report(question: &str, background: &str, outcome: &DebateOutcome) -> String {
    let scores = &outcome.scores;
    let mut out = String::new();

    out.push_str(&format!("{}\n\n", REPORT_TITLE));
    out.push_str(&format!("{}\n", HEADING_QUESTION));
    out.push_str(&format!("**Question:** {}\n\n", question));
    out.push_str(&format!("{}\n", HEADING_BACKGROUND));
    out.push_str(&format!("{}\n\n", background));
    out.push_str(&format!("{}\n\n", HEADING_SCORING));

    out.push_str(&format!("### Bull case (score: {}/100)\n", scores.bull));
    push_points(&mut out, &outcome.key_points.bull);
    out.push_str(&format!("### Bear case (score: {}/100)\n", scores.bear));
    push_points(&mut out, &outcome.key_points.bear);

    if !outcome.transcript.entries.is_empty() {
        out.push_str("### Debate transcript\n");
        for round in outcome.transcript.rounds() {
            for side in [Side::Bull, Side::Bear] {
                if let Some(text) = outcome.transcript.statement(round, side) {
                    out.push_str(&format!("- Round {} ({}): {}\n", round, side, text));
                }
            }
        }
        out.push('\n');
    }
    if let Some(diagnostic) = &outcome.transcript.diagnostic {
        out.push_str(&format!("_Debate diagnostic: {}_\n\n", diagnostic));
    }

    out.push_str(&format!("### Final score: {}/100\n", scores.final_score));
    out.push_str(&format!(
        "- **Confidence:** {}\n",
        scores.confidence.to_string().to_uppercase()
    ));
    out.push_str(&format!(
        "- **Risk level:** {}\n",
        outcome.assessment.risk_level.to_string().to_uppercase()
    ));
    out.push_str(&format!(
        "- **Recommendation:** {}\n",
        outcome.assessment.recommendation
    ));
    if !outcome.summary.is_empty() {
        out.push_str(&format!("- **Judge summary:** {}\n", outcome.summary));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", HEADING_CONCLUSION));
    out.push_str(conclusion_for(scores.final_score));
    out
}

fn push_points(out: &mut String, points: &[String]) {
    for (i, point) in points.iter().take(MAX_KEY_POINTS).enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, point));
    }
    out.push('\n');
}
