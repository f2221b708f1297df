//! Perception System
//!
//! Builds the bounded view an agent gets before deciding. Perception never
//! mutates state; any randomized detail selection draws from the caller's rng.
//!
//! Poor agents get explicit threats and opportunities. Everyone else gets no
//! threats and a single `everything_available` opportunity.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sim_events::EconomicTier;

use crate::components::agent::Agent;
use crate::components::world::{SecurityLevel, UnknownLocationError};
use crate::state::SimulationState;

/// Perception thresholds
pub mod limits {
    /// Maximum detail lines sampled from a location view
    pub const MAX_DETAILS: usize = 3;
    /// Hunger above this is a starvation threat
    pub const STARVATION_HUNGER: u8 = 80;
    /// Exhaustion above this is a collapse threat
    pub const COLLAPSE_EXHAUSTION: u8 = 90;
    /// Money below this means food is unaffordable
    pub const FOOD_MONEY: i64 = 20;
}

/// Threat labels
pub mod threats {
    pub const SECURITY_WATCHING: &str = "security_watching";
    pub const STARVATION_IMMINENT: &str = "starvation_imminent";
    pub const COLLAPSE_RISK: &str = "collapse_risk";
    pub const CANNOT_AFFORD_FOOD: &str = "cannot_afford_food";
}

/// Opportunity labels
pub mod opportunities {
    pub const SUBMIT_GIG_WORK: &str = "submit_gig_work";
    pub const GET_FOOD: &str = "get_food";
    pub const DRINK_WATER: &str = "drink_water";
    pub const CHARGE_DEVICES: &str = "charge_devices";
    pub const EVERYTHING_AVAILABLE: &str = "everything_available";
}

/// What one agent can see of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleAgent {
    pub id: String,
    pub appearance: String,
    pub activity: String,
}

/// World-level notices visible to everyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalNotice {
    pub rent_strike_participants: usize,
    pub community_fund: Decimal,
}

/// The bounded, tier-filtered view for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    pub agent_id: String,
    pub tier: EconomicTier,
    pub location_id: String,
    pub location_name: String,
    pub description: String,
    pub mood: String,
    pub details: Vec<String>,
    pub resources: Vec<String>,
    pub entry_cost: Decimal,
    pub security: SecurityLevel,
    pub occupants: usize,
    pub capacity: u32,
    pub time: String,
    pub hour: u32,
    pub is_night: bool,
    pub is_work_hours: bool,
    pub others_present: Vec<VisibleAgent>,
    pub threats: Vec<String>,
    pub opportunities: Vec<String>,
    pub global: GlobalNotice,
}

impl Perception {
    pub fn has_resource(&self, tag: &str) -> bool {
        self.resources.iter().any(|r| r == tag || r == "everything")
    }

    pub fn has_threat(&self, label: &str) -> bool {
        self.threats.iter().any(|t| t == label)
    }

    pub fn other_ids(&self) -> Vec<&str> {
        self.others_present.iter().map(|o| o.id.as_str()).collect()
    }
}

/// Derives the perception for `agent` from a tick-start snapshot.
pub fn perceive<R: Rng>(
    agent: &Agent,
    state: &SimulationState,
    rng: &mut R,
) -> Result<Perception, UnknownLocationError> {
    let location = state.registry.get_location(agent.location())?;
    let tier = agent.tier();
    let view = location.view_for(tier);
    let clock = &state.world.clock;

    let details: Vec<String> = view
        .details
        .choose_multiple(rng, limits::MAX_DETAILS)
        .cloned()
        .collect();

    let others_present: Vec<VisibleAgent> = state
        .agents
        .values()
        .filter(|other| other.id != agent.id && other.location() == location.id)
        .map(|other| VisibleAgent {
            id: other.id.clone(),
            appearance: other.appearance.clone(),
            activity: other.last_emotion.clone(),
        })
        .collect();

    let (threats, opportunities) = if tier.is_poor() {
        (poor_threats(agent, location.security), poor_opportunities(location))
    } else {
        (
            Vec::new(),
            vec![opportunities::EVERYTHING_AVAILABLE.to_string()],
        )
    };

    Ok(Perception {
        agent_id: agent.id.clone(),
        tier,
        location_id: location.id.clone(),
        location_name: location.name.clone(),
        description: view.description.clone(),
        mood: view.mood.clone(),
        details,
        resources: location.resources.iter().cloned().collect(),
        entry_cost: location.entry_cost,
        security: location.security,
        occupants: others_present.len() + 1,
        capacity: location.capacity,
        time: clock.stamp(),
        hour: clock.hour(),
        is_night: clock.is_night(),
        is_work_hours: clock.is_work_hours(),
        others_present,
        threats,
        opportunities,
        global: GlobalNotice {
            rent_strike_participants: state.world.events.rent_strike.len(),
            community_fund: state.world.events.community_fund,
        },
    })
}

fn poor_threats(agent: &Agent, security: SecurityLevel) -> Vec<String> {
    let needs = agent.needs();
    let mut found = Vec::new();
    if security == SecurityLevel::High {
        found.push(threats::SECURITY_WATCHING.to_string());
    }
    if needs.hunger() > limits::STARVATION_HUNGER {
        found.push(threats::STARVATION_IMMINENT.to_string());
    }
    if needs.exhaustion() > limits::COLLAPSE_EXHAUSTION {
        found.push(threats::COLLAPSE_RISK.to_string());
    }
    if agent.money() < Decimal::from(limits::FOOD_MONEY) {
        found.push(threats::CANNOT_AFFORD_FOOD.to_string());
    }
    found
}

fn poor_opportunities(location: &crate::components::world::Location) -> Vec<String> {
    let table = [
        ("wifi", opportunities::SUBMIT_GIG_WORK),
        ("free_food", opportunities::GET_FOOD),
        ("water_fountain", opportunities::DRINK_WATER),
        ("power_outlets", opportunities::CHARGE_DEVICES),
    ];
    table
        .iter()
        .filter(|(tag, _)| location.has_resource(tag))
        .map(|(_, label)| label.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::Needs;
    use crate::setup;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn state_with(agents: Vec<Agent>) -> SimulationState {
        let mut state = SimulationState::new(setup::create_world_map(), 6);
        for agent in agents {
            state.insert_agent(agent);
        }
        state
    }

    #[test]
    fn test_poor_agent_sees_threats_and_opportunities() {
        let alex = Agent::new("alex_chen", Decimal::from(15), "public_library")
            .with_needs(Needs::new(85, 95, 60));
        let state = state_with(vec![alex.clone()]);
        let mut rng = SmallRng::seed_from_u64(1);

        let p = perceive(&alex, &state, &mut rng).unwrap();

        assert_eq!(p.tier, EconomicTier::Poor);
        for threat in [
            threats::SECURITY_WATCHING,
            threats::STARVATION_IMMINENT,
            threats::COLLAPSE_RISK,
            threats::CANNOT_AFFORD_FOOD,
        ] {
            assert!(p.has_threat(threat), "missing {}", threat);
        }
        assert!(p.opportunities.contains(&opportunities::SUBMIT_GIG_WORK.to_string()));
        assert!(p.opportunities.contains(&opportunities::DRINK_WATER.to_string()));
        assert!(p.details.len() <= limits::MAX_DETAILS);
    }

    #[test]
    fn test_affluent_agent_sees_everything_available() {
        let tyler = Agent::new("tyler_chen", Decimal::from(45_000), "public_library");
        let state = state_with(vec![tyler.clone()]);
        let mut rng = SmallRng::seed_from_u64(1);

        let p = perceive(&tyler, &state, &mut rng).unwrap();

        assert!(p.threats.is_empty());
        assert_eq!(p.opportunities, vec![opportunities::EVERYTHING_AVAILABLE.to_string()]);
    }

    #[test]
    fn test_others_present_exclude_self_and_private_state() {
        let alex = Agent::new("alex_chen", Decimal::from(47), "food_bank");
        let maria = Agent::new("maria_gonzalez", Decimal::from(340), "food_bank")
            .with_appearance("Nurse in faded scrubs");
        let tyler = Agent::new("tyler_chen", Decimal::from(45_000), "tech_office");
        let state = state_with(vec![alex.clone(), maria, tyler]);
        let mut rng = SmallRng::seed_from_u64(1);

        let p = perceive(&alex, &state, &mut rng).unwrap();

        assert_eq!(p.other_ids(), vec!["maria_gonzalez"]);
        assert_eq!(p.others_present[0].appearance, "Nurse in faded scrubs");
        assert_eq!(p.occupants, 2);
    }

    #[test]
    fn test_perception_is_idempotent() {
        let alex = Agent::new("alex_chen", Decimal::from(47), "public_library")
            .with_needs(Needs::new(85, 40, 60));
        let state = state_with(vec![alex.clone()]);
        let before = state.clone();

        let first = perceive(&alex, &state, &mut SmallRng::seed_from_u64(99)).unwrap();
        let second = perceive(&alex, &state, &mut SmallRng::seed_from_u64(99)).unwrap();

        assert_eq!(first, second);
        assert_eq!(state, before);
    }

    #[test]
    fn test_unknown_location_is_an_error() {
        let lost = Agent::new("lost", Decimal::from(47), "atlantis");
        let state = state_with(vec![]);
        let err = perceive(&lost, &state, &mut SmallRng::seed_from_u64(1)).unwrap_err();
        assert_eq!(err.location, "atlantis");
    }
}
