//! Simulation State
//!
//! The explicit state object owned by the orchestrator and passed by
//! reference into every component.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::components::agent::Agent;
use crate::components::social::RelationshipGraph;
use crate::components::world::{LocationRegistry, Occupancy, UnknownLocationError, WorldState};
use crate::systems::ledger::Ledger;

/// Why a move through the state was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("agent '{0}' not found")]
    UnknownAgent(String),

    #[error(transparent)]
    UnknownLocation(#[from] UnknownLocationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub world: WorldState,
    pub registry: LocationRegistry,
    /// Agents keyed by id; ordered iteration keeps runs reproducible
    pub agents: BTreeMap<String, Agent>,
    pub relationships: RelationshipGraph,
    pub occupancy: Occupancy,
    pub ledger: Ledger,
}

impl SimulationState {
    pub fn new(registry: LocationRegistry, start_hour: u32) -> Self {
        Self {
            world: WorldState::new(start_hour),
            registry,
            agents: BTreeMap::new(),
            relationships: RelationshipGraph::new(),
            occupancy: Occupancy::new(),
            ledger: Ledger::default(),
        }
    }

    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Adds or replaces an agent and refreshes the occupancy projection.
    pub fn insert_agent(&mut self, mut agent: Agent) {
        self.ledger.admit(&mut agent);
        self.agents.insert(agent.id.clone(), agent);
        self.rebuild_occupancy();
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn rebuild_occupancy(&mut self) {
        self.occupancy.rebuild(self.agents.values());
    }

    /// Moves an agent, failing without side effects if either end is unknown.
    pub fn move_agent(&mut self, agent_id: &str, to: &str) -> Result<(), MoveError> {
        let Some(agent) = self.agents.get_mut(agent_id) else {
            return Err(MoveError::UnknownAgent(agent_id.to_string()));
        };
        self.registry.move_agent(agent, to, &mut self.occupancy)?;
        Ok(())
    }

    /// Agents whose location is not registered.
    pub fn misplaced_agents(&self) -> Vec<&str> {
        self.agents
            .values()
            .filter(|a| !self.registry.contains(a.location()))
            .map(|a| a.id.as_str())
            .collect()
    }
}
