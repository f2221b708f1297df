//! World Components
//!
//! Locations, the location registry, the occupancy projection, and
//! world-level state (clock, global events).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use uuid::Uuid;

use sim_events::{generate_encounter_id, EconomicTier, WorldClock};

use super::agent::Agent;

/// Raised when a location id does not resolve in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown location: '{location}'")]
pub struct UnknownLocationError {
    pub location: String,
}

impl UnknownLocationError {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// How closely a location is watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// Who may use a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRule {
    #[default]
    Public,
    EmployeesOnly,
    ResidentsOnly,
}

/// What an agent of a given tier sees when standing here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationView {
    pub description: String,
    pub details: Vec<String>,
    pub mood: String,
}

impl LocationView {
    pub fn new(description: impl Into<String>, mood: impl Into<String>, details: &[&str]) -> Self {
        Self {
            description: description.into(),
            details: details.iter().map(|d| d.to_string()).collect(),
            mood: mood.into(),
        }
    }
}

/// A named place with fixed capability tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    /// Resource tags such as "wifi" or "free_food"
    pub resources: BTreeSet<String>,
    /// Soft limit, reported but not enforced
    pub capacity: u32,
    pub entry_cost: Decimal,
    pub security: SecurityLevel,
    pub access: AccessRule,
    /// View for poor agents
    pub poor_view: LocationView,
    /// View for everyone else
    pub comfortable_view: LocationView,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resources: BTreeSet::new(),
            capacity: 20,
            entry_cost: Decimal::ZERO,
            security: SecurityLevel::None,
            access: AccessRule::Public,
            poor_view: LocationView::default(),
            comfortable_view: LocationView::default(),
        }
    }

    pub fn with_resources(mut self, resources: &[&str]) -> Self {
        self.resources.extend(resources.iter().map(|r| r.to_string()));
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_entry_cost(mut self, cost: Decimal) -> Self {
        self.entry_cost = cost;
        self
    }

    pub fn with_security(mut self, security: SecurityLevel) -> Self {
        self.security = security;
        self
    }

    pub fn with_access(mut self, access: AccessRule) -> Self {
        self.access = access;
        self
    }

    pub fn with_views(mut self, poor: LocationView, comfortable: LocationView) -> Self {
        self.poor_view = poor;
        self.comfortable_view = comfortable;
        self
    }

    pub fn has_resource(&self, tag: &str) -> bool {
        self.resources.contains(tag) || self.resources.contains("everything")
    }

    pub fn view_for(&self, tier: EconomicTier) -> &LocationView {
        if tier.is_poor() {
            &self.poor_view
        } else {
            &self.comfortable_view
        }
    }
}

/// All locations, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRegistry {
    locations: BTreeMap<String, Location>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, location: Location) {
        self.locations.insert(location.id.clone(), location);
    }

    pub fn get_location(&self, id: &str) -> Result<&Location, UnknownLocationError> {
        self.locations
            .get(id)
            .ok_or_else(|| UnknownLocationError::new(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locations.contains_key(id)
    }

    pub fn location_ids(&self) -> Vec<&str> {
        self.locations.keys().map(|k| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Moves an agent between two registered locations.
    ///
    /// Both ends must exist; on error the agent and projection are untouched.
    pub fn move_agent(
        &self,
        agent: &mut Agent,
        to: &str,
        occupancy: &mut Occupancy,
    ) -> Result<(), UnknownLocationError> {
        let from = agent.location().to_string();
        self.get_location(&from)?;
        self.get_location(to)?;
        if from == to {
            return Ok(());
        }
        agent.set_location(to);
        occupancy.relocate(&agent.id, &from, to);
        Ok(())
    }
}

/// Cached projection: which agents are at each location.
///
/// Agent records own their location; this is rebuilt from them before
/// every encounter scan and kept current by validated moves in between.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occupancy {
    by_location: BTreeMap<String, BTreeSet<String>>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the projection from agent records.
    pub fn rebuild<'a>(&mut self, agents: impl IntoIterator<Item = &'a Agent>) {
        self.by_location.clear();
        for agent in agents {
            self.add(agent.location(), &agent.id);
        }
    }

    pub fn add(&mut self, location_id: &str, agent_id: &str) {
        self.by_location
            .entry(location_id.to_string())
            .or_default()
            .insert(agent_id.to_string());
    }

    fn relocate(&mut self, agent_id: &str, from: &str, to: &str) {
        if let Some(set) = self.by_location.get_mut(from) {
            set.remove(agent_id);
            if set.is_empty() {
                self.by_location.remove(from);
            }
        }
        self.add(to, agent_id);
    }

    /// Agent ids at a location, sorted.
    pub fn at_location(&self, location_id: &str) -> Vec<&str> {
        self.by_location
            .get(location_id)
            .map(|set| set.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn count_at(&self, location_id: &str) -> usize {
        self.by_location.get(location_id).map_or(0, |set| set.len())
    }

    /// Locations with at least `min` occupants.
    pub fn crowded(&self, min: usize) -> Vec<(&str, Vec<&str>)> {
        self.by_location
            .iter()
            .filter(|(_, set)| set.len() >= min)
            .map(|(loc, set)| (loc.as_str(), set.iter().map(|s| s.as_str()).collect()))
            .collect()
    }
}

/// Plain mutable registry of world-wide happenings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalEvents {
    pub rent_strike: BTreeSet<String>,
    pub community_fund: Decimal,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
}

impl GlobalEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the agent was not already participating.
    pub fn join_rent_strike(&mut self, agent_id: &str) -> bool {
        self.rent_strike.insert(agent_id.to_string())
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }
}

/// World-level state persisted as one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub world_id: Uuid,
    pub clock: WorldClock,
    pub events: GlobalEvents,
    /// Encounters resolved so far; ids continue from here after a resume
    #[serde(default)]
    pub encounter_count: u64,
}

impl WorldState {
    pub fn new(start_hour: u32) -> Self {
        Self {
            world_id: Uuid::new_v4(),
            clock: WorldClock::start(start_hour),
            events: GlobalEvents::new(),
            encounter_count: 0,
        }
    }

    /// Next encounter id in this world's sequence.
    pub fn next_encounter_id(&mut self) -> String {
        self.encounter_count += 1;
        generate_encounter_id(self.encounter_count)
    }

    pub fn turn(&self) -> u64 {
        self.clock.turn
    }
}
