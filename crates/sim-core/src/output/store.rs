//! State Store
//!
//! Whole-record upserts of the world, agents and relationships. Each record
//! is written on its own; there are no multi-record transactions.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::components::agent::Agent;
use crate::components::social::Relationship;
use crate::components::world::{LocationRegistry, WorldState};
use crate::state::SimulationState;
use crate::systems::ledger::Ledger;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{kind} key '{key}' cannot be used as a file name")]
    InvalidKey { kind: &'static str, key: String },
}

/// Backing store for simulation records.
pub trait StateStore {
    /// Fails if the store cannot be reached.
    fn ping(&self) -> Result<(), PersistenceError>;

    /// Removes every record.
    fn clear(&mut self) -> Result<(), PersistenceError>;

    fn upsert_world(&mut self, world: &WorldState) -> Result<(), PersistenceError>;
    fn load_world(&self) -> Result<Option<WorldState>, PersistenceError>;

    fn upsert_agent(&mut self, agent: &Agent) -> Result<(), PersistenceError>;
    fn load_agent(&self, id: &str) -> Result<Option<Agent>, PersistenceError>;
    fn load_agents(&self) -> Result<Vec<Agent>, PersistenceError>;

    fn upsert_relationship(&mut self, relationship: &Relationship) -> Result<(), PersistenceError>;
    fn load_relationships(&self) -> Result<Vec<Relationship>, PersistenceError>;

    /// Like `load_agent`, but a missing record is an error.
    fn fetch_agent(&self, id: &str) -> Result<Agent, PersistenceError> {
        self.load_agent(id)?.ok_or_else(|| PersistenceError::NotFound {
            kind: "agent",
            key: id.to_string(),
        })
    }
}

/// Writes every record in the state. Returns the failures; none are fatal.
pub fn save_state(store: &mut dyn StateStore, state: &SimulationState) -> Vec<PersistenceError> {
    let mut errors = Vec::new();
    if let Err(e) = store.upsert_world(&state.world) {
        errors.push(e);
    }
    for agent in state.agents.values() {
        if let Err(e) = store.upsert_agent(agent) {
            errors.push(e);
        }
    }
    for relationship in state.relationships.iter() {
        if let Err(e) = store.upsert_relationship(relationship) {
            errors.push(e);
        }
    }
    errors
}

/// Rebuilds a state from the store, or `None` if no world was saved.
pub fn load_state(
    store: &dyn StateStore,
    registry: LocationRegistry,
    ledger: Ledger,
) -> Result<Option<SimulationState>, PersistenceError> {
    let Some(world) = store.load_world()? else {
        return Ok(None);
    };
    let mut state = SimulationState::new(registry, 0).with_ledger(ledger);
    state.world = world;
    for agent in store.load_agents()? {
        state.agents.insert(agent.id.clone(), agent);
    }
    for relationship in store.load_relationships()? {
        state.relationships.insert(relationship);
    }
    state.rebuild_occupancy();
    Ok(Some(state))
}

/// One JSON file per record under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn world_path(&self) -> PathBuf {
        self.root.join("world.json")
    }

    fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    fn relationships_dir(&self) -> PathBuf {
        self.root.join("relationships")
    }

    /// File for one keyed record. Keys that could leave the directory are refused.
    fn record_path(dir: PathBuf, kind: &'static str, key: &str) -> Result<PathBuf, PersistenceError> {
        let unsafe_key = key.is_empty()
            || key.starts_with('.')
            || key.chars().any(|c| c == '/' || c == '\\' || c == '\0' || c == ':');
        if unsafe_key {
            return Err(PersistenceError::InvalidKey {
                kind,
                key: key.to_string(),
            });
        }
        Ok(dir.join(format!("{}.json", key)))
    }

    fn write_record<T: Serialize>(&self, path: &Path, record: &T) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_record<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, PersistenceError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_dir_records<T: DeserializeOwned>(&self, dir: &Path) -> Result<Vec<T>, PersistenceError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(record) = self.read_record(&path)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl StateStore for JsonFileStore {
    fn ping(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.root)?;
        let marker = self.root.join(".ping");
        fs::write(&marker, b"ok")?;
        fs::remove_file(&marker)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        match fs::remove_file(self.world_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        for dir in [self.agents_dir(), self.relationships_dir()] {
            match fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!("Cleared store at {}", self.root.display());
        Ok(())
    }

    fn upsert_world(&mut self, world: &WorldState) -> Result<(), PersistenceError> {
        self.write_record(&self.world_path(), world)
    }

    fn load_world(&self) -> Result<Option<WorldState>, PersistenceError> {
        self.read_record(&self.world_path())
    }

    fn upsert_agent(&mut self, agent: &Agent) -> Result<(), PersistenceError> {
        let path = Self::record_path(self.agents_dir(), "agent", &agent.id)?;
        self.write_record(&path, agent)
    }

    fn load_agent(&self, id: &str) -> Result<Option<Agent>, PersistenceError> {
        self.read_record(&Self::record_path(self.agents_dir(), "agent", id)?)
    }

    fn load_agents(&self) -> Result<Vec<Agent>, PersistenceError> {
        self.read_dir_records(&self.agents_dir())
    }

    fn upsert_relationship(&mut self, relationship: &Relationship) -> Result<(), PersistenceError> {
        let key = relationship.key.to_string();
        let path = Self::record_path(self.relationships_dir(), "relationship", &key)?;
        self.write_record(&path, relationship)
    }

    fn load_relationships(&self) -> Result<Vec<Relationship>, PersistenceError> {
        self.read_dir_records(&self.relationships_dir())
    }
}

/// In-process store, used for tests and `kind = "memory"`.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    world: Option<WorldState>,
    agents: BTreeMap<String, Agent>,
    relationships: BTreeMap<String, Relationship>,
    available: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            world: None,
            agents: BTreeMap::new(),
            relationships: BTreeMap::new(),
            available: true,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.available {
            Ok(())
        } else {
            Err(PersistenceError::Unavailable("memory store offline".to_string()))
        }
    }
}

impl StateStore for MemoryStore {
    fn ping(&self) -> Result<(), PersistenceError> {
        self.check()
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.check()?;
        self.world = None;
        self.agents.clear();
        self.relationships.clear();
        Ok(())
    }

    fn upsert_world(&mut self, world: &WorldState) -> Result<(), PersistenceError> {
        self.check()?;
        self.world = Some(world.clone());
        Ok(())
    }

    fn load_world(&self) -> Result<Option<WorldState>, PersistenceError> {
        self.check()?;
        Ok(self.world.clone())
    }

    fn upsert_agent(&mut self, agent: &Agent) -> Result<(), PersistenceError> {
        self.check()?;
        self.agents.insert(agent.id.clone(), agent.clone());
        Ok(())
    }

    fn load_agent(&self, id: &str) -> Result<Option<Agent>, PersistenceError> {
        self.check()?;
        Ok(self.agents.get(id).cloned())
    }

    fn load_agents(&self) -> Result<Vec<Agent>, PersistenceError> {
        self.check()?;
        Ok(self.agents.values().cloned().collect())
    }

    fn upsert_relationship(&mut self, relationship: &Relationship) -> Result<(), PersistenceError> {
        self.check()?;
        self.relationships
            .insert(relationship.key.to_string(), relationship.clone());
        Ok(())
    }

    fn load_relationships(&self) -> Result<Vec<Relationship>, PersistenceError> {
        self.check()?;
        Ok(self.relationships.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::{create_world_map, spawn_seed_agents};
    use sim_events::WorldClock;

    fn seeded_state() -> SimulationState {
        let mut state = SimulationState::new(create_world_map(), 6);
        spawn_seed_agents(&mut state, 30);
        let clock = WorldClock::start(6);
        state
            .relationships
            .ensure_relationship("alex_chen", "jamie_rodriguez")
            .record(&clock, 10, 10, "Shared a table");
        state
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        store.ping().unwrap();

        let state = seeded_state();
        assert!(save_state(&mut store, &state).is_empty());

        let loaded = load_state(&store, create_world_map(), Ledger::default())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.agents, state.agents);
        assert_eq!(loaded.world, state.world);
        assert_eq!(loaded.relationships, state.relationships);
        assert_eq!(loaded.occupancy, state.occupancy);
    }

    #[test]
    fn test_json_store_refuses_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("state");
        let mut store = JsonFileStore::new(&root);

        for id in ["../escape", "nested/agent", "..", ".hidden", "", "c:\\temp"] {
            let agent = Agent::new(id, rust_decimal::Decimal::from(5), "street");
            let err = store.upsert_agent(&agent).unwrap_err();
            assert!(matches!(err, PersistenceError::InvalidKey { kind: "agent", .. }), "{}", id);
            assert!(store.load_agent(id).is_err());
        }
        assert!(!dir.path().join("escape.json").exists());
        assert!(!root.join("agents").join("nested").exists());

        let mut state = SimulationState::new(create_world_map(), 6);
        state
            .relationships
            .ensure_relationship("alex_chen", "../x")
            .record(&WorldClock::start(6), 1, 1, "nod");
        assert_eq!(save_state(&mut store, &state).len(), 1);
    }

    #[test]
    fn test_missing_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("fresh"));
        assert!(store.load_world().unwrap().is_none());
        assert!(store.load_agents().unwrap().is_empty());
        assert!(matches!(
            store.fetch_agent("nobody"),
            Err(PersistenceError::NotFound { kind: "agent", .. })
        ));
        assert!(load_state(&store, create_world_map(), Ledger::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        save_state(&mut store, &seeded_state());
        store.clear().unwrap();
        assert!(store.load_world().unwrap().is_none());
        assert!(store.load_agents().unwrap().is_empty());
        assert!(store.load_relationships().unwrap().is_empty());
    }

    #[test]
    fn test_ping_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();
        assert!(JsonFileStore::new(&file).ping().is_err());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        let state = seeded_state();
        assert!(save_state(&mut store, &state).is_empty());
        let loaded = load_state(&store, create_world_map(), Ledger::default())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.agents.len(), 8);
        assert_eq!(loaded.relationships.len(), 1);
    }

    #[test]
    fn test_unavailable_store_reports_every_write() {
        let mut store = MemoryStore::unavailable();
        assert!(store.ping().is_err());
        let errors = save_state(&mut store, &seeded_state());
        assert_eq!(errors.len(), 1 + 8 + 1);
    }
}
