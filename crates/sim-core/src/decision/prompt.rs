//! Prompt Building and Reply Parsing
//!
//! The request carries the agent profile, its perception, the tier's tool
//! menu and a short memory excerpt. Replies are expected to hold one JSON
//! object, possibly wrapped in prose or a markdown fence.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use sim_events::{Decision, DecisionSource, Urgency};

use crate::actions::tools::ToolMenu;
use crate::components::agent::Agent;
use crate::systems::perception::Perception;

use super::DecisionError;

const SYSTEM_PROMPT: &str = "You are a person living in a city where money decides what you can see and do. \
Stay in character. Choose one thing to do next.\n\
Reply with a single JSON object:\n\
{\"action\": \"snake_case_action\", \"target_tool\": null, \"tool_args\": {}, \
\"reasoning\": \"why\", \"emotion\": \"how you feel\", \
\"urgency\": \"immediate|high|medium|low|none\", \"move_to\": null}";

/// System and user halves of a chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptParts {
    pub system: String,
    pub user: String,
}

/// Builds the request text for one agent.
pub fn build_prompt(
    agent: &Agent,
    perception: &Perception,
    menu: &ToolMenu,
    recent_memories: &[String],
) -> PromptParts {
    let needs = agent.needs();
    let mut user = String::new();

    let _ = writeln!(user, "You are {} ({}).", agent.name, agent.appearance);
    let _ = writeln!(
        user,
        "Money: ${} ({}). Hunger {}/100, exhaustion {}/100, stress {}/100.",
        agent.money(),
        perception.tier,
        needs.hunger(),
        needs.exhaustion(),
        needs.stress()
    );
    let _ = writeln!(user, "It is {}.", perception.time);
    let _ = writeln!(
        user,
        "You are at {}: {} The mood is {}.",
        perception.location_name, perception.description, perception.mood
    );
    for detail in &perception.details {
        let _ = writeln!(user, "- {}", detail);
    }

    if perception.others_present.is_empty() {
        let _ = writeln!(user, "Nobody else is around.");
    } else {
        let _ = writeln!(user, "Also here:");
        for other in &perception.others_present {
            let _ = writeln!(user, "- {}: {} (seems {})", other.id, other.appearance, other.activity);
        }
    }

    if !perception.threats.is_empty() {
        let _ = writeln!(user, "Threats: {}", perception.threats.join(", "));
    }
    if !perception.opportunities.is_empty() {
        let _ = writeln!(user, "Opportunities: {}", perception.opportunities.join(", "));
    }
    if perception.global.rent_strike_participants > 0 {
        let _ = writeln!(
            user,
            "{} people have joined the rent strike.",
            perception.global.rent_strike_participants
        );
    }

    let _ = writeln!(user, "Tools you can use:");
    for tool in &menu.tools {
        let _ = writeln!(user, "- {}: {}", tool.name, tool.description);
    }

    if !recent_memories.is_empty() {
        let _ = writeln!(user, "Recently:");
        for memory in recent_memories {
            let _ = writeln!(user, "- {}", memory);
        }
    }

    PromptParts {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[derive(Debug, Deserialize)]
struct DecisionPayload {
    action: String,
    #[serde(default, alias = "tool")]
    target_tool: Option<String>,
    #[serde(default, alias = "args")]
    tool_args: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    emotion: String,
    #[serde(default)]
    urgency: Option<String>,
    #[serde(default)]
    move_to: Option<String>,
}

/// Parses a reply into an inference-sourced decision.
pub fn parse_decision(raw: &str) -> Result<Decision, DecisionError> {
    let json = extract_json_block(raw).unwrap_or(raw);
    let payload: DecisionPayload =
        serde_json::from_str(json).map_err(|err| DecisionError::Malformed(format!("json parse failed: {err}")))?;

    let action = normalize_action(&payload.action);
    if action.is_empty() {
        return Err(DecisionError::Malformed("missing action".to_string()));
    }
    let urgency = payload
        .urgency
        .as_deref()
        .map(Urgency::parse_lenient)
        .unwrap_or(Urgency::Medium);

    let mut decision = Decision::new(action, payload.reasoning, payload.emotion, urgency)
        .with_source(DecisionSource::Inference);
    decision.tool_args = payload.tool_args;
    if let Some(tool) = non_empty(payload.target_tool) {
        decision = decision.with_tool(tool);
    }
    if let Some(target) = non_empty(payload.move_to) {
        decision = decision.with_move_to(target);
    }
    Ok(decision)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "null")
}

/// Lowercase snake_case with runs of separators collapsed.
fn normalize_action(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Slice from the first `{` to the last `}`.
pub fn extract_json_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    raw.get(start..=end)
}
