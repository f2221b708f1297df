//! Turn Orchestrator
//!
//! One tick: every agent perceives and decides against a snapshot taken at
//! tick start, then decisions are committed one agent at a time, needs
//! drift, the encounter phase runs on the committed state, the clock
//! advances once and the state is persisted.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use sim_events::{Decision, DecisionSource, EncounterRecord, TelemetryEvent, WorldClock};

use crate::actions::{ActionResolver, Resolution};
use crate::components::agent::Agent;
use crate::components::world::UnknownLocationError;
use crate::config::{ConfigError, SimConfig, SimulationConfig, StoreConfig, StoreKind};
use crate::decision::{DecisionProvider, FallbackProvider, HttpCompletionClient, InferenceProvider};
use crate::output::store::{load_state, save_state, JsonFileStore, MemoryStore, PersistenceError, StateStore};
use crate::output::telemetry::{JsonlTelemetrySink, TelemetrySink};
use crate::setup;
use crate::state::{MoveError, SimulationState};
use crate::systems::encounter::EncounterEngine;
use crate::systems::ledger::Ledger;
use crate::systems::needs::update_needs;
use crate::systems::perception::perceive;

/// Why one agent's turn became a no-op.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("agent '{0}' not found")]
    AgentMissing(String),

    #[error(transparent)]
    UnknownLocation(#[from] UnknownLocationError),
}

impl From<MoveError> for TurnError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::UnknownAgent(id) => TurnError::AgentMissing(id),
            MoveError::UnknownLocation(e) => TurnError::UnknownLocation(e),
        }
    }
}

/// One agent's committed turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentTurn {
    pub decision: Decision,
    pub resolution: Resolution,
}

/// A turn that degraded to a no-op.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedTurn {
    pub agent_id: String,
    pub reason: String,
}

/// Everything that happened in one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub turn: u64,
    /// Clock at tick start
    pub clock: WorldClock,
    pub turns: Vec<AgentTurn>,
    pub skipped: Vec<SkippedTurn>,
    pub encounters: Vec<EncounterRecord>,
    pub persistence_failures: usize,
}

impl TickReport {
    pub fn fallback_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.decision.source == DecisionSource::Fallback)
            .count()
    }
}

/// Owns the state and every collaborator for a run.
pub struct Simulation {
    state: SimulationState,
    settings: SimulationConfig,
    provider: Box<dyn DecisionProvider>,
    resolver: ActionResolver,
    encounters: EncounterEngine,
    store: Box<dyn StateStore>,
    telemetry: Box<dyn TelemetrySink>,
    rng: SmallRng,
}

impl Simulation {
    /// A simulation with the fallback provider, an in-memory store and no telemetry.
    pub fn new(state: SimulationState, settings: SimulationConfig) -> Self {
        Self {
            provider: Box::new(FallbackProvider::new(settings.seed.wrapping_add(1))),
            encounters: EncounterEngine::new(settings.max_encounter_pairs_per_location),
            rng: SmallRng::seed_from_u64(settings.seed),
            resolver: ActionResolver::default(),
            store: Box::new(MemoryStore::new()),
            telemetry: Box::new(JsonlTelemetrySink::null()),
            state,
            settings,
        }
    }

    pub fn with_provider(mut self, provider: Box<dyn DecisionProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_resolver(mut self, resolver: ActionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn into_state(self) -> SimulationState {
        self.state
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Returns the agent, creating it with a seed or default profile first.
    pub fn ensure_agent(&mut self, id: &str) -> &mut Agent {
        setup::ensure_agent(&mut self.state, id, self.settings.memory_cap)
    }

    /// Runs one full tick.
    pub fn tick(&mut self) -> TickReport {
        let snapshot = self.state.clone();
        let clock = snapshot.world.clock;
        tracing::debug!("Tick {} starting at {}", clock.turn, clock.stamp());

        // Perceive and decide: reads only the snapshot
        let mut planned: Vec<(String, Result<Decision, TurnError>)> = Vec::with_capacity(snapshot.agents.len());
        for agent in snapshot.agents.values() {
            let decision = perceive(agent, &snapshot, &mut self.rng)
                .map(|perception| {
                    let recent = agent.memories.recent_lines(self.settings.prompt_memory_count);
                    self.provider.decide(agent, &perception, &recent)
                })
                .map_err(TurnError::from);
            planned.push((agent.id.clone(), decision));
        }

        // Commit, one agent at a time
        let mut turns = Vec::new();
        let mut skipped = Vec::new();
        for (agent_id, decision) in planned {
            let outcome = decision.and_then(|decision| {
                self.resolver
                    .resolve(&mut self.state, &agent_id, &decision)
                    .map(|resolution| (decision, resolution))
            });
            match outcome {
                Ok((decision, resolution)) => {
                    self.telemetry.emit(
                        &TelemetryEvent::new(&agent_id, clock)
                            .with_goal(format!("{} ({})", resolution.category, decision.urgency))
                            .with_action(&decision.action)
                            .with_rationale(&decision.reasoning)
                            .with_result(&resolution.summary),
                    );
                    turns.push(AgentTurn { decision, resolution });
                }
                Err(e) => {
                    tracing::warn!("Turn for {} skipped: {}", agent_id, e);
                    skipped.push(SkippedTurn {
                        agent_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let ledger = self.state.ledger;
        for agent in self.state.agents.values_mut() {
            update_needs(&ledger, agent);
        }

        let encounters = self.encounters.run(&mut self.state, &mut self.rng);

        let (min, max) = (self.settings.min_step_minutes, self.settings.max_step_minutes);
        let step = if min < max { self.rng.gen_range(min..=max) } else { min };
        self.state.world.clock.advance(step);

        let failures = save_state(self.store.as_mut(), &self.state);
        for e in &failures {
            tracing::warn!("Persist failed at turn {}: {}", clock.turn, e);
        }
        self.telemetry.flush();

        TickReport {
            turn: clock.turn,
            clock,
            turns,
            skipped,
            encounters,
            persistence_failures: failures.len(),
        }
    }

    /// Runs `turns` ticks and returns their reports.
    pub fn run(&mut self, turns: u64) -> Vec<TickReport> {
        (0..turns).map(|_| self.tick()).collect()
    }
}

/// Opens the configured store.
pub fn open_store(config: &StoreConfig) -> Box<dyn StateStore> {
    match config.kind {
        StoreKind::Json => Box::new(JsonFileStore::new(&config.directory)),
        StoreKind::Memory => Box::new(MemoryStore::new()),
    }
}

/// Loads the saved state, or seeds a fresh world.
///
/// Any store error here is fatal: the caller should exit.
pub fn bootstrap(
    config: &SimulationConfig,
    store: &mut dyn StateStore,
    reset: bool,
) -> Result<SimulationState, PersistenceError> {
    store.ping()?;
    if reset {
        store.clear()?;
    }

    let ledger = Ledger::new(config.debt_enabled);
    if let Some(mut state) = load_state(store, setup::create_world_map(), ledger)? {
        for agent in state.agents.values_mut() {
            agent.memories.set_cap(config.memory_cap);
        }
        tracing::info!(
            "Loaded world at turn {} with {} agents",
            state.world.turn(),
            state.agents.len()
        );
        return Ok(state);
    }

    let mut state = SimulationState::new(setup::create_world_map(), config.start_hour).with_ledger(ledger);
    let count = setup::spawn_seed_agents(&mut state, config.memory_cap);
    tracing::info!("Seeded new world with {} agents", count);
    if let Some(e) = save_state(store, &state).into_iter().next() {
        return Err(e);
    }
    Ok(state)
}

/// Builds the decision provider the config asks for.
pub fn build_provider(config: &SimConfig, use_inference: bool) -> Result<Box<dyn DecisionProvider>, ConfigError> {
    let fallback = FallbackProvider::new(config.simulation.seed.wrapping_add(1));
    if !(use_inference || config.inference.enabled) {
        return Ok(Box::new(fallback));
    }

    let inference = &config.inference;
    let client = HttpCompletionClient::from_config(inference)?;
    let provider = InferenceProvider::new(client, inference.model.clone(), fallback)
        .with_max_retries(inference.effective_retries())
        .with_max_tokens(inference.max_tokens)
        .with_prompt_memory_count(config.simulation.prompt_memory_count)
        .with_gate(inference.gate())
        .with_cost_tracker(inference.cost_tracker());
    tracing::info!("Inference enabled with model {}", inference.model);
    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::Needs;
    use rust_decimal::Decimal;

    fn seeded(settings: &SimulationConfig) -> SimulationState {
        let mut store = MemoryStore::new();
        bootstrap(settings, &mut store, false).unwrap()
    }

    #[test]
    fn test_tick_advances_clock_once() {
        let settings = SimulationConfig::default();
        let mut sim = Simulation::new(seeded(&settings), settings);
        let report = sim.tick();

        assert_eq!(report.turn, 0);
        assert_eq!(sim.state().world.turn(), 1);
        assert_eq!(sim.state().world.clock.stamp(), "06:30am");
        assert_eq!(report.turns.len(), 8);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_every_agent_gets_one_memory_per_action() {
        let settings = SimulationConfig::default();
        let mut sim = Simulation::new(seeded(&settings), settings);
        let report = sim.tick();

        for turn in &report.turns {
            let agent = sim.state().agent(&turn.resolution.agent_id).unwrap();
            let own: Vec<_> = agent
                .memories
                .iter()
                .filter(|m| !m.text.starts_with("encounter_with_"))
                .collect();
            assert_eq!(own.len(), 1, "{}", agent.id);
        }
    }

    #[test]
    fn test_decisions_read_the_tick_start_snapshot() {
        let mut settings = SimulationConfig::default();
        settings.max_encounter_pairs_per_location = 0;
        let mut state = SimulationState::new(setup::create_world_map(), 6);
        state.insert_agent(
            Agent::new("a_first", Decimal::from(47), "public_library").with_needs(Needs::new(85, 10, 10)),
        );
        state.insert_agent(
            Agent::new("b_second", Decimal::from(60), "street").with_needs(Needs::new(10, 10, 10)),
        );
        let mut sim = Simulation::new(state, settings);
        let report = sim.tick();

        // b_second sees nobody at tick start even if a_first moved during commit
        let b = report
            .turns
            .iter()
            .find(|t| t.resolution.agent_id == "b_second")
            .unwrap();
        assert!(!b.decision.action.starts_with("interact_with_"));
    }

    #[test]
    fn test_misplaced_agent_degrades_to_no_op() {
        let settings = SimulationConfig::default();
        let mut state = seeded(&settings);
        state
            .agents
            .insert("ghost".to_string(), Agent::new("ghost", Decimal::from(5), "atlantis"));
        let mut sim = Simulation::new(state, settings);

        let report = sim.tick();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].agent_id, "ghost");
        assert_eq!(report.turns.len(), 8);
        assert_eq!(sim.state().agent("ghost").unwrap().location(), "atlantis");
    }

    #[test]
    fn test_store_failure_does_not_abort_tick() {
        let settings = SimulationConfig::default();
        let mut sim =
            Simulation::new(seeded(&settings), settings).with_store(Box::new(MemoryStore::unavailable()));
        let report = sim.tick();
        assert!(report.persistence_failures > 0);
        assert_eq!(sim.state().world.turn(), 1);
    }

    #[test]
    fn test_bootstrap_fails_when_store_unreachable() {
        let mut store = MemoryStore::unavailable();
        assert!(bootstrap(&SimulationConfig::default(), &mut store, false).is_err());
    }

    #[test]
    fn test_bootstrap_resumes_then_resets() {
        let settings = SimulationConfig::default();
        let mut store = MemoryStore::new();
        let state = bootstrap(&settings, &mut store, false).unwrap();

        let mut sim = Simulation::new(state, settings.clone());
        sim.tick();
        save_state(&mut store, sim.state());

        let resumed = bootstrap(&settings, &mut store, false).unwrap();
        assert_eq!(resumed.world.turn(), 1);

        let fresh = bootstrap(&settings, &mut store, true).unwrap();
        assert_eq!(fresh.world.turn(), 0);
        assert!(fresh.agents.values().all(|a| a.memories.is_empty()));
    }

    #[test]
    fn test_telemetry_per_agent_turn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        let settings = SimulationConfig::default();
        let sink = JsonlTelemetrySink::new(&path).unwrap();
        let mut sim = Simulation::new(seeded(&settings), settings).with_telemetry(Box::new(sink));
        let report = sim.tick();
        drop(sim);

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<TelemetryEvent> = content
            .lines()
            .map(|l| TelemetryEvent::from_jsonl(l).unwrap())
            .collect();
        assert_eq!(events.len(), report.turns.len());
        assert!(events.iter().all(|e| e.clock.turn == 0 && !e.action.is_empty()));
    }

    #[test]
    fn test_variable_clock_step_stays_in_range() {
        let mut settings = SimulationConfig::default();
        settings.min_step_minutes = 15;
        settings.max_step_minutes = 45;
        let mut sim = Simulation::new(seeded(&settings), settings);
        let mut last = sim.state().world.clock.elapsed_minutes;
        for _ in 0..10 {
            sim.tick();
            let now = sim.state().world.clock.elapsed_minutes;
            assert!((15..=45).contains(&(now - last)));
            last = now;
        }
    }

    #[test]
    fn test_lazy_agent_joins_next_tick() {
        let settings = SimulationConfig::default();
        let mut sim = Simulation::new(seeded(&settings), settings);
        sim.ensure_agent("newcomer");
        let report = sim.tick();
        assert!(report.turns.iter().any(|t| t.resolution.agent_id == "newcomer"));
    }
}
