//! Event Types
//!
//! Records emitted by the simulation: per-agent telemetry and encounter outcomes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timestamp::WorldClock;

/// Telemetry record sent once per agent per tick.
///
/// The sink contract is `{goal, action, rationale, result}`; the agent and
/// clock are attached so a consumer can order records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub agent_id: String,
    pub clock: WorldClock,
    pub goal: String,
    pub action: String,
    pub rationale: String,
    pub result: String,
}

impl TelemetryEvent {
    pub fn new(agent_id: impl Into<String>, clock: WorldClock) -> Self {
        Self {
            agent_id: agent_id.into(),
            clock,
            goal: String::new(),
            action: String::new(),
            rationale: String::new(),
            result: String::new(),
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = result.into();
        self
    }

    /// Serialize to a single JSONL line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Classification of a meeting between two co-located agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterType {
    /// Both agents are poor
    Solidarity,
    /// Money gap above the tension threshold
    ClassTension,
    /// Exactly one agent is poor; outcome is probabilistic
    CompassionOrDismissal,
    Neutral,
}

impl EncounterType {
    pub fn all() -> &'static [EncounterType] {
        &[
            EncounterType::Solidarity,
            EncounterType::ClassTension,
            EncounterType::CompassionOrDismissal,
            EncounterType::Neutral,
        ]
    }
}

impl fmt::Display for EncounterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterType::Solidarity => write!(f, "solidarity"),
            EncounterType::ClassTension => write!(f, "class_tension"),
            EncounterType::CompassionOrDismissal => write!(f, "compassion_or_dismissal"),
            EncounterType::Neutral => write!(f, "neutral"),
        }
    }
}

/// Outcome of a resolved encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRecord {
    /// Unique identifier, e.g. "enc_00000001"
    pub encounter_id: String,
    pub clock: WorldClock,
    pub location: String,
    /// Participants in the order they were sampled
    pub participants: (String, String),
    pub encounter_type: EncounterType,
    pub summary: String,
    pub trust_delta: i32,
    pub affinity_delta: i32,
    /// Money moved from one participant to the other, zero when none
    pub transfer: Decimal,
}

/// Formats an encounter identifier from a sequence number.
pub fn generate_encounter_id(sequence: u64) -> String {
    format!("enc_{:08}", sequence)
}
