//! Encounter System
//!
//! Detects co-located agents, samples a bounded number of pairs per location,
//! classifies each meeting from the two agents' money, and applies the
//! trust/affinity table, optional transfers, memories and relationship history.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

use sim_events::{EconomicTier, EncounterRecord, EncounterType};

use crate::state::SimulationState;

/// Encounter tables
pub mod encounter_constants {
    /// Money gap above which a meeting is class tension
    pub const CLASS_TENSION_GAP: i64 = 10_000;
    /// Default cap on pairs sampled per location per tick
    pub const MAX_PAIRS_PER_LOCATION: usize = 2;
    /// Chance a richer agent helps a poor one
    pub const HELP_CHANCE: f32 = 0.3;
    /// Amount moved when help is given
    pub const HELP_AMOUNT: i64 = 20;
    /// Amount shared between two poor agents
    pub const SOLIDARITY_SHARE: i64 = 5;
    /// Sharer must hold more than this
    pub const SHARE_GIVER_MIN: i64 = 10;
    /// Receiver must hold less than this
    pub const SHARE_RECEIVER_MAX: i64 = 5;

    pub const SOLIDARITY: (i32, i32) = (10, 10);
    pub const CLASS_TENSION: (i32, i32) = (-5, -10);
    pub const COMPASSION: (i32, i32) = (15, 10);
    pub const DISMISSAL: (i32, i32) = (0, -2);
    pub const NEUTRAL: (i32, i32) = (1, 1);
}

/// Classifies a meeting. Symmetric in its arguments.
pub fn classify_encounter(a_money: Decimal, b_money: Decimal) -> EncounterType {
    let a_poor = EconomicTier::from_money(a_money).is_poor();
    let b_poor = EconomicTier::from_money(b_money).is_poor();
    let gap = (a_money - b_money).abs();

    if a_poor && b_poor {
        EncounterType::Solidarity
    } else if gap > Decimal::from(encounter_constants::CLASS_TENSION_GAP) {
        EncounterType::ClassTension
    } else if a_poor || b_poor {
        EncounterType::CompassionOrDismissal
    } else {
        EncounterType::Neutral
    }
}

/// Samples up to `min(max_pairs, n / 2)` disjoint pairs.
pub fn sample_pairs<R: Rng>(occupants: &[&str], max_pairs: usize, rng: &mut R) -> Vec<(String, String)> {
    let count = max_pairs.min(occupants.len() / 2);
    if count == 0 {
        return Vec::new();
    }
    let mut shuffled: Vec<&str> = occupants.to_vec();
    shuffled.shuffle(rng);
    shuffled
        .chunks_exact(2)
        .take(count)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

/// Runs the encounter phase over the whole world.
#[derive(Debug, Clone)]
pub struct EncounterEngine {
    pub max_pairs_per_location: usize,
}

impl Default for EncounterEngine {
    fn default() -> Self {
        Self::new(encounter_constants::MAX_PAIRS_PER_LOCATION)
    }
}

impl EncounterEngine {
    pub fn new(max_pairs_per_location: usize) -> Self {
        Self { max_pairs_per_location }
    }

    /// Scans every location with two or more occupants and resolves sampled pairs.
    pub fn run<R: Rng>(&mut self, state: &mut SimulationState, rng: &mut R) -> Vec<EncounterRecord> {
        state.rebuild_occupancy();
        let groups: Vec<(String, Vec<String>)> = state
            .occupancy
            .crowded(2)
            .into_iter()
            .map(|(loc, ids)| (loc.to_string(), ids.into_iter().map(String::from).collect()))
            .collect();

        let mut records = Vec::new();
        for (location, ids) in groups {
            let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
            for (a, b) in sample_pairs(&refs, self.max_pairs_per_location, rng) {
                if let Some(record) = self.resolve(state, &location, &a, &b, rng) {
                    records.push(record);
                }
            }
        }
        records
    }

    /// Resolves one pair. Missing agents are logged and skipped.
    pub fn resolve<R: Rng>(
        &mut self,
        state: &mut SimulationState,
        location: &str,
        a_id: &str,
        b_id: &str,
        rng: &mut R,
    ) -> Option<EncounterRecord> {
        let Some(mut a) = state.agents.remove(a_id) else {
            tracing::warn!("Skipping encounter at {}: agent {} missing", location, a_id);
            return None;
        };
        let Some(mut b) = state.agents.remove(b_id) else {
            tracing::warn!("Skipping encounter at {}: agent {} missing", location, b_id);
            state.agents.insert(a.id.clone(), a);
            return None;
        };

        let ledger = state.ledger;
        let clock = state.world.clock;
        let encounter_type = classify_encounter(a.money(), b.money());
        let mut transfer = Decimal::ZERO;

        let (trust, affinity, summary) = match encounter_type {
            EncounterType::Solidarity => {
                let share = Decimal::from(encounter_constants::SOLIDARITY_SHARE);
                let giver_min = Decimal::from(encounter_constants::SHARE_GIVER_MIN);
                let receiver_max = Decimal::from(encounter_constants::SHARE_RECEIVER_MAX);
                if a.money() > giver_min && b.money() < receiver_max {
                    transfer = ledger.transfer(&mut a, &mut b, share);
                } else if b.money() > giver_min && a.money() < receiver_max {
                    transfer = ledger.transfer(&mut b, &mut a, share);
                }
                let (t, f) = encounter_constants::SOLIDARITY;
                let summary = if transfer > Decimal::ZERO {
                    format!("Shared ${} and survival tips in solidarity", transfer)
                } else {
                    "Shared survival tips in solidarity".to_string()
                };
                (t, f, summary)
            }
            EncounterType::ClassTension => {
                let (t, f) = encounter_constants::CLASS_TENSION;
                (t, f, "Tense moment across the class divide".to_string())
            }
            EncounterType::CompassionOrDismissal => {
                let help = Decimal::from(encounter_constants::HELP_AMOUNT);
                let helped = rng.gen::<f32>() < encounter_constants::HELP_CHANCE;
                let (rich, poor) = if a.tier().is_poor() { (&mut b, &mut a) } else { (&mut a, &mut b) };
                if helped && rich.money() >= help {
                    transfer = ledger.transfer(rich, poor, help);
                    let (t, f) = encounter_constants::COMPASSION;
                    (t, f, format!("{} helped {} with ${}", rich.name, poor.name, transfer))
                } else {
                    let (t, f) = encounter_constants::DISMISSAL;
                    (t, f, format!("{} looked past {}", rich.name, poor.name))
                }
            }
            EncounterType::Neutral => {
                let (t, f) = encounter_constants::NEUTRAL;
                (t, f, "Exchanged polite nods".to_string())
            }
        };

        a.remember(&clock, &format!("encounter_with_{}", b.id), &summary);
        b.remember(&clock, &format!("encounter_with_{}", a.id), &summary);
        state
            .relationships
            .ensure_relationship(&a.id, &b.id)
            .record(&clock, trust, affinity, summary.clone());

        tracing::debug!("{} at {}: {} / {} -> {}", encounter_type, location, a.id, b.id, summary);

        let record = EncounterRecord {
            encounter_id: state.world.next_encounter_id(),
            clock,
            location: location.to_string(),
            participants: (a.id.clone(), b.id.clone()),
            encounter_type,
            summary,
            trust_delta: trust,
            affinity_delta: affinity,
            transfer,
        };

        state.agents.insert(a.id.clone(), a);
        state.agents.insert(b.id.clone(), b);
        Some(record)
    }
}
