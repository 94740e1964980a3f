//! Prompt text for every model call the engine makes.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever any template changes so
//! logged runs can be traced back to the prompt that produced them.

use coordination::ontology::schema_description;
use coordination::{AgentState, DebateBrief, Role};

/// Prompt version. Bump on any template change.
pub const PROMPT_VERSION: &str = "1.3.0";

/// Tool menu and output contract for the reasoning stage.
pub const DECISION_FORMAT: &str = "\
You have access to two tools:
- `query_graph`: ask the industry knowledge graph a natural-language question.
- `web_search`: search the web for recent news or facts missing from the graph.

--- Format ---
If you need more info from the knowledge graph:
{\"action\": \"query_graph\", \"query\": \"YOUR_QUESTION_HERE\"}

If the graph has nothing and you need current information:
{\"action\": \"web_search\", \"query\": \"YOUR_SEARCH_QUERY\"}

If you have enough info to answer:
{\"action\": \"final_answer\", \"content\": \"YOUR_FINAL_ANSWER\", \"requires_debate\": true, \"confidence\": 0.0}

`requires_debate` is true when the answer involves an investment view, an outlook, \
or a judgement call that benefits from opposing perspectives. `confidence` is your \
confidence in the answer between 0.0 and 1.0.

--- Constraints ---
1. Output ONLY valid JSON.
2. Do not explain your thought process outside the JSON.
3. Prefer the knowledge graph; use web search only when the graph cannot help.
";

/// Rubric for the reflection stage.
pub const REFLECTION_RUBRIC: &str = "\
Judge the candidate answer ONLY against what the knowledge graph and the search \
results above can support.
- PASS if every concrete claim is backed by the observations, or if the answer \
honestly states that the data is missing.
- FAIL if the answer contains specific figures, names, or facts that do not appear \
in the observations and cannot be verified, or if it ignores the question.

Respond with JSON only:
{\"pass\": true, \"reason\": \"one sentence\"}
";

/// Bull analyst role brief.
pub const BULL_BRIEF: &str = "\
BULL ANALYST: argue why the subject is a good opportunity. Highlight technology \
leadership, market position, and growth potential. Give 3-5 specific points, each \
grounded in the background data. Be optimistic but factual.";

/// Bear analyst role brief.
pub const BEAR_BRIEF: &str = "\
BEAR ANALYST: argue the risks. Highlight competition, valuation, regulatory and \
market risks. Question assumptions and look for red flags. Give 3-5 specific \
points, each grounded in the background data. Be skeptical but fair.";

/// Judge role brief.
pub const JUDGE_BRIEF: &str = "\
JUDGE: evaluate both sides impartially. Score the bull case and the bear case from \
0 to 100. The final score is the equal-weight average of the two. Pick the top 3 \
points for each side, a confidence tier, a risk level, and a recommendation.";

/// Output contract for the consolidated debate call.
pub const DEBATE_FORMAT: &str = "\
Run the debate in two rounds, then the judge's assessment.
Round 1: each analyst states their case.
Round 2: each analyst gives a final position, optionally rebutting the other side.

Respond with JSON only, exactly in this shape:
{
  \"rounds\": [
    {\"round\": 1, \"bull\": \"...\", \"bear\": \"...\"},
    {\"round\": 2, \"bull\": \"...\", \"bear\": \"...\"}
  ],
  \"judge\": {
    \"bull_score\": 0,
    \"bear_score\": 0,
    \"final_score\": 0,
    \"confidence\": \"high\" | \"medium\" | \"low\",
    \"summary\": \"2-3 sentences\",
    \"key_bull_points\": [\"...\", \"...\", \"...\"],
    \"key_bear_points\": [\"...\", \"...\", \"...\"],
    \"risk_level\": \"low\" | \"medium\" | \"high\",
    \"recommendation\": \"Buy\" | \"Hold\" | \"Sell\" | \"Neutral\"
  }
}
";

/// Rules for text-to-Cypher generation.
pub const CYPHER_RULES: &str = "\
--- Rules (CRITICAL) ---
1. Use ONLY the provided labels and relationship types.
2. Do NOT use markdown code blocks. Output ONLY the raw query.
3. Use case-insensitive matching: `WHERE toLower(n.name) CONTAINS toLower('value')`
4. NEVER use `UNION` or `UNION ALL`.
5. To fetch multiple relationships, use `OPTIONAL MATCH`.
6. Always bind relationship variables before using `type(r)`, e.g. `-[r:REL]->`.
7. Return explicit columns, not nodes or maps.
8. Limit results to 50.
";

/// Few-shot examples for text-to-Cypher generation.
pub const CYPHER_EXAMPLES: &str = "\
--- Examples ---
User: Who supplies NVIDIA?
Cypher: MATCH (s)-[:SUPPLIES]->(o:Organization) WHERE toLower(o.name) CONTAINS 'nvidia' RETURN s.name AS Supplier, o.name AS Organization LIMIT 50

User: What does NVIDIA do? (Suppliers, Technologies, etc.)
Cypher: MATCH (n:Organization) WHERE toLower(n.name) CONTAINS 'nvidia' OPTIONAL MATCH (n)-[:DEVELOPS]->(t) OPTIONAL MATCH (s)-[:SUPPLIES]->(n) RETURN n.name AS Organization, collect(distinct t.name) AS Technologies, collect(distinct s.name) AS Suppliers LIMIT 50

User: What technologies does TSMC develop?
Cypher: MATCH (s:Organization)-[:DEVELOPS]->(t:Technology) WHERE toLower(s.name) CONTAINS 'tsmc' RETURN t.name AS Technology LIMIT 50
";

/// Render the message log the way every prompt shows it.
pub fn render_history(state: &AgentState) -> String {
    let mut out = String::new();
    for message in &state.messages {
        let label = match message.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Observation => "Tool Output",
        };
        out.push_str(label);
        out.push_str(": ");
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}

/// Prompt asking for the next decision.
pub fn reasoning_prompt(domain: &str, state: &AgentState) -> String {
    let mut prompt = format!("You are a {domain} industry analyst agent.\n{DECISION_FORMAT}");
    prompt.push_str("\n--- History ---\n");
    prompt.push_str(&render_history(state));
    if let Some(feedback) = &state.error {
        prompt.push_str("\n--- Reviewer Feedback ---\n");
        prompt.push_str("Your previous answer was rejected: ");
        prompt.push_str(feedback);
        prompt.push_str("\nGather the missing evidence or revise the answer.\n");
    }
    prompt.push_str("\nNext Step (JSON):");
    prompt
}

/// Prompt asking the model to critique a candidate answer.
pub fn reflection_prompt(domain: &str, state: &AgentState, answer: &str) -> String {
    format!(
        "You are a strict {domain} research reviewer.\n\n\
         --- Question ---\n{question}\n\n\
         --- Observations ---\n{history}\n\
         --- Candidate Answer ---\n{answer}\n\n\
         {REFLECTION_RUBRIC}",
        question = state.question(),
        history = render_history(state),
    )
}

/// Consolidated debate prompt: topic, background, three role briefs, contract.
pub fn debate_prompt(domain: &str, brief: &DebateBrief) -> String {
    format!(
        "You are moderating a structured {domain} investment debate between three roles.\n\n\
         Topic: {question}\n\n\
         Background Context: {background}\n\n\
         {BULL_BRIEF}\n\n{BEAR_BRIEF}\n\n{JUDGE_BRIEF}\n\n{DEBATE_FORMAT}",
        question = brief.question,
        background = brief.background,
    )
}

/// Prompt for translating a question into one Cypher query.
pub fn cypher_prompt(question: &str) -> String {
    format!(
        "You are a Neo4j Cypher expert for an industry knowledge graph.\n\
         Generate a SINGLE Cypher query to answer the user's question.\n\n\
         --- Schema ---\n{schema}\n{CYPHER_RULES}\n{CYPHER_EXAMPLES}\n\
         --- Current Question ---\nUser: {question}\nCypher:",
        schema = schema_description(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordination::{Decision, Message, StateUpdate};

    fn sample_state() -> AgentState {
        let mut state = AgentState::with_question("Who supplies NVIDIA?");
        state.apply(StateUpdate::new().with_message(Message::decision(&Decision::QueryGraph {
            query: "Who supplies NVIDIA?".into(),
        })));
        state.apply(StateUpdate::new().with_observation("Graph Search Result: []"));
        state
    }

    #[test]
    fn test_history_labels() {
        let history = render_history(&sample_state());
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines[0], "User: Who supplies NVIDIA?");
        assert!(lines[1].starts_with("Assistant: {\"action\":\"query_graph\""));
        assert_eq!(lines[2], "Tool Output: Graph Search Result: []");
    }

    #[test]
    fn test_reasoning_prompt_is_deterministic() {
        let state = sample_state();
        let a = reasoning_prompt("semiconductor", &state);
        assert_eq!(a, reasoning_prompt("semiconductor", &state));
        assert!(a.starts_with("You are a semiconductor industry analyst agent."));
        assert!(a.ends_with("Next Step (JSON):"));
        assert!(!a.contains("Reviewer Feedback"));
    }

    #[test]
    fn test_reasoning_prompt_includes_pending_feedback() {
        let mut state = sample_state();
        state.apply(StateUpdate::new().with_error("revenue figure unsupported"));
        let prompt = reasoning_prompt("semiconductor", &state);
        assert!(prompt.contains("Reviewer Feedback"));
        assert!(prompt.contains("revenue figure unsupported"));
    }

    #[test]
    fn test_debate_prompt_carries_roles_and_brief() {
        let brief = DebateBrief {
            question: "Is TSMC a buy?".into(),
            background: "TSMC leads at 3nm.".into(),
        };
        let prompt = debate_prompt("semiconductor", &brief);
        for needle in ["Topic: Is TSMC a buy?", "TSMC leads at 3nm.", "BULL ANALYST", "BEAR ANALYST", "JUDGE", "\"rounds\""] {
            assert!(prompt.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_cypher_prompt_embeds_schema() {
        let prompt = cypher_prompt("What does ASML develop?");
        assert!(prompt.contains("(Organization)-[:DEVELOPS]->(Technology)"));
        assert!(prompt.ends_with("User: What does ASML develop?\nCypher:"));
    }
}
