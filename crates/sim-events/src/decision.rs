//! Decision Records
//!
//! The structured output of a decision provider for one agent on one turn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How pressing an agent considers its chosen action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Immediate,
    High,
    Medium,
    Low,
    None,
}

impl Urgency {
    /// Immediate or high.
    pub fn is_pressing(self) -> bool {
        matches!(self, Urgency::Immediate | Urgency::High)
    }

    /// Lenient parse used for model replies; unknown labels map to medium.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Urgency::Medium)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Immediate => write!(f, "immediate"),
            Urgency::High => write!(f, "high"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::Low => write!(f, "low"),
            Urgency::None => write!(f, "none"),
        }
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" | "critical" => Ok(Urgency::Immediate),
            "high" => Ok(Urgency::High),
            "medium" | "moderate" => Ok(Urgency::Medium),
            "low" => Ok(Urgency::Low),
            "none" => Ok(Urgency::None),
            other => Err(format!("invalid urgency: '{}'", other)),
        }
    }
}

/// Which provider produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Inference,
    Fallback,
}

/// A decision chosen for an agent this tick.
///
/// `emotion` is descriptive only and never drives control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: String,
    #[serde(default)]
    pub target_tool: Option<String>,
    #[serde(default)]
    pub tool_args: BTreeMap<String, serde_json::Value>,
    pub reasoning: String,
    pub emotion: String,
    pub urgency: Urgency,
    /// Optional relocation request, validated against the registry.
    #[serde(default)]
    pub move_to: Option<String>,
    pub source: DecisionSource,
}

impl Decision {
    /// Creates a fallback-sourced decision with no tool or move.
    pub fn new(
        action: impl Into<String>,
        reasoning: impl Into<String>,
        emotion: impl Into<String>,
        urgency: Urgency,
    ) -> Self {
        Self {
            action: action.into(),
            target_tool: None,
            tool_args: BTreeMap::new(),
            reasoning: reasoning.into(),
            emotion: emotion.into(),
            urgency,
            move_to: None,
            source: DecisionSource::Fallback,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.target_tool = Some(tool.into());
        self
    }

    pub fn with_tool_arg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.tool_args.insert(key.into(), value);
        self
    }

    pub fn with_move_to(mut self, location: impl Into<String>) -> Self {
        self.move_to = Some(location.into());
        self
    }

    pub fn with_source(mut self, source: DecisionSource) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_parse() {
        assert_eq!("HIGH".parse::<Urgency>().unwrap(), Urgency::High);
        assert_eq!(" immediate ".parse::<Urgency>().unwrap(), Urgency::Immediate);
        assert!("panic".parse::<Urgency>().is_err());
        assert_eq!(Urgency::parse_lenient("panic"), Urgency::Medium);
    }

    #[test]
    fn test_urgency_pressing() {
        assert!(Urgency::Immediate.is_pressing());
        assert!(Urgency::High.is_pressing());
        assert!(!Urgency::Medium.is_pressing());
        assert!(!Urgency::None.is_pressing());
    }

    #[test]
    fn test_decision_builder() {
        let decision = Decision::new("stream_for_donations", "Need money", "desperate", Urgency::High)
            .with_tool("ask_viewers_for_help")
            .with_tool_arg("message", serde_json::json!("please help"));

        assert_eq!(decision.target_tool.as_deref(), Some("ask_viewers_for_help"));
        assert_eq!(decision.tool_args.len(), 1);
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert!(decision.move_to.is_none());
    }

    #[test]
    fn test_decision_deserialize_defaults() {
        let json = r#"{
            "action": "visit_food_bank",
            "reasoning": "hungry",
            "emotion": "tired",
            "urgency": "high",
            "source": "inference"
        }"#;
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.urgency, Urgency::High);
        assert_eq!(decision.source, DecisionSource::Inference);
        assert!(decision.target_tool.is_none());
        assert!(decision.tool_args.is_empty());
    }
}
