//! Social Components
//!
//! Relationships between pairs of agents. The pair key is order-independent
//! and the relationship label is always derived from trust, affinity and
//! history length.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use sim_events::WorldClock;

/// Label thresholds, evaluated from most extreme to least.
pub mod thresholds {
    /// Both scores below this: enemy
    pub const ENEMY: i32 = -50;
    /// Both scores above this: friend
    pub const FRIEND: i32 = 50;
    /// Either score below this: adversary
    pub const ADVERSARY: i32 = -30;
    /// Both scores above this: ally
    pub const ALLY: i32 = 30;
    /// History longer than this: acquaintance
    pub const ACQUAINTANCE_HISTORY: usize = 1;
}

/// Derived relationship label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Stranger,
    Acquaintance,
    Ally,
    Adversary,
    Friend,
    Enemy,
}

impl RelationshipType {
    /// Pure label function. Buckets do not overlap: each input maps to the
    /// first matching rule, checked from most extreme to least.
    pub fn classify(trust: i32, affinity: i32, history_len: usize) -> Self {
        use thresholds::*;

        if trust < ENEMY && affinity < ENEMY {
            RelationshipType::Enemy
        } else if trust > FRIEND && affinity > FRIEND {
            RelationshipType::Friend
        } else if trust < ADVERSARY || affinity < ADVERSARY {
            RelationshipType::Adversary
        } else if trust > ALLY && affinity > ALLY {
            RelationshipType::Ally
        } else if history_len > ACQUAINTANCE_HISTORY {
            RelationshipType::Acquaintance
        } else {
            RelationshipType::Stranger
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RelationshipType::Stranger => "stranger",
            RelationshipType::Acquaintance => "acquaintance",
            RelationshipType::Ally => "ally",
            RelationshipType::Adversary => "adversary",
            RelationshipType::Friend => "friend",
            RelationshipType::Enemy => "enemy",
        };
        write!(f, "{}", label)
    }
}

/// Unordered pair of agent ids, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub first: String,
    pub second: String,
}

impl RelationshipKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                first: a.to_string(),
                second: b.to_string(),
            }
        } else {
            Self {
                first: b.to_string(),
                second: a.to_string(),
            }
        }
    }

    pub fn involves(&self, agent_id: &str) -> bool {
        self.first == agent_id || self.second == agent_id
    }

    pub fn other(&self, agent_id: &str) -> Option<&str> {
        if self.first == agent_id {
            Some(&self.second)
        } else if self.second == agent_id {
            Some(&self.first)
        } else {
            None
        }
    }
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.first, self.second)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub turn: u64,
    pub stamp: String,
    pub summary: String,
}

/// Relationship between two agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub key: RelationshipKey,
    trust: i32,
    affinity: i32,
    history: Vec<HistoryEntry>,
    #[serde(rename = "type")]
    kind: RelationshipType,
}

impl Relationship {
    pub fn new(key: RelationshipKey) -> Self {
        Self {
            key,
            trust: 0,
            affinity: 0,
            history: Vec::new(),
            kind: RelationshipType::Stranger,
        }
    }

    pub fn trust(&self) -> i32 {
        self.trust
    }

    pub fn affinity(&self) -> i32 {
        self.affinity
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn kind(&self) -> RelationshipType {
        self.kind
    }

    /// Applies score deltas, appends one history entry, recomputes the label.
    pub fn record(&mut self, clock: &WorldClock, trust_delta: i32, affinity_delta: i32, summary: impl Into<String>) {
        self.trust = self.trust.saturating_add(trust_delta);
        self.affinity = self.affinity.saturating_add(affinity_delta);
        self.history.push(HistoryEntry {
            turn: clock.turn,
            stamp: clock.stamp(),
            summary: summary.into(),
        });
        self.refresh();
    }

    /// Recomputes the label from the stored scores.
    pub fn refresh(&mut self) {
        self.kind = RelationshipType::classify(self.trust, self.affinity, self.history.len());
    }

    /// True when the stored label matches its inputs.
    pub fn is_consistent(&self) -> bool {
        self.kind == RelationshipType::classify(self.trust, self.affinity, self.history.len())
    }
}

/// All relationships, keyed by unordered pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipGraph {
    relationships: BTreeMap<RelationshipKey, Relationship>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&Relationship> {
        self.relationships.get(&RelationshipKey::new(a, b))
    }

    /// Gets or creates the relationship between two agents.
    pub fn ensure_relationship(&mut self, a: &str, b: &str) -> &mut Relationship {
        let key = RelationshipKey::new(a, b);
        self.relationships
            .entry(key.clone())
            .or_insert_with(|| Relationship::new(key))
    }

    /// Inserts a loaded record, recomputing its label.
    pub fn insert(&mut self, mut relationship: Relationship) {
        relationship.refresh();
        self.relationships.insert(relationship.key.clone(), relationship);
    }

    pub fn relationships_for(&self, agent_id: &str) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.key.involves(agent_id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_independent() {
        assert_eq!(RelationshipKey::new("b", "a"), RelationshipKey::new("a", "b"));
        let key = RelationshipKey::new("zed", "amy");
        assert_eq!(key.first, "amy");
        assert_eq!(key.other("amy"), Some("zed"));
        assert_eq!(key.other("bob"), None);
    }

    #[test]
    fn test_classify_buckets() {
        assert_eq!(RelationshipType::classify(0, 0, 0), RelationshipType::Stranger);
        assert_eq!(RelationshipType::classify(0, 0, 2), RelationshipType::Acquaintance);
        assert_eq!(RelationshipType::classify(31, 31, 0), RelationshipType::Ally);
        assert_eq!(RelationshipType::classify(51, 51, 0), RelationshipType::Friend);
        assert_eq!(RelationshipType::classify(-31, 10, 0), RelationshipType::Adversary);
        assert_eq!(RelationshipType::classify(10, -31, 0), RelationshipType::Adversary);
    }

    #[test]
    fn test_enemy_is_reachable() {
        assert_eq!(RelationshipType::classify(-51, -51, 5), RelationshipType::Enemy);
        // One extreme score alone stays adversary
        assert_eq!(RelationshipType::classify(-80, -40, 5), RelationshipType::Adversary);
    }

    #[test]
    fn test_record_recomputes_label() {
        let mut graph = RelationshipGraph::new();
        let clock = WorldClock::start(6);
        let rel = graph.ensure_relationship("alex_chen", "jamie_rodriguez");
        for _ in 0..4 {
            rel.record(&clock, 10, 10, "Shared solidarity");
        }
        assert_eq!(rel.trust(), 40);
        assert_eq!(rel.kind(), RelationshipType::Ally);
        assert!(rel.is_consistent());

        for _ in 0..2 {
            rel.record(&clock, 10, 10, "Shared solidarity");
        }
        assert_eq!(rel.kind(), RelationshipType::Friend);
        assert_eq!(rel.history().len(), 6);
    }

    #[test]
    fn test_insert_refreshes_stale_label() {
        let mut stale = Relationship::new(RelationshipKey::new("a", "b"));
        stale.trust = -60;
        stale.affinity = -60;
        stale.kind = RelationshipType::Friend;

        let mut graph = RelationshipGraph::new();
        graph.insert(stale);
        assert_eq!(graph.get("b", "a").map(|r| r.kind()), Some(RelationshipType::Enemy));
    }

    #[test]
    fn test_relationships_for() {
        let mut graph = RelationshipGraph::new();
        graph.ensure_relationship("a", "b");
        graph.ensure_relationship("a", "c");
        graph.ensure_relationship("b", "c");
        assert_eq!(graph.relationships_for("a").len(), 2);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_relationship_type_serializes_as_type() {
        let rel = Relationship::new(RelationshipKey::new("a", "b"));
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["type"], "stranger");
    }
}
