//! Agent Setup
//!
//! Seed profiles for the starting cast and the default profile used when an
//! agent is first referenced without one.

use rust_decimal::Decimal;

use crate::components::agent::{Agent, Needs};
use crate::state::SimulationState;

use super::world::DEFAULT_LOCATION;

/// Starting money for agents created on first reference.
pub const DEFAULT_MONEY: i64 = 50;

/// A data-only seed profile.
#[derive(Debug, Clone)]
pub struct SeedProfile {
    pub id: &'static str,
    pub money: Decimal,
    pub location: &'static str,
    pub needs: (i64, i64, i64),
    pub preferred_actions: &'static [&'static str],
    pub appearance: &'static str,
    pub items: &'static [&'static str],
    pub stream_followers: u64,
}

/// The starting cast.
pub fn seed_profiles() -> Vec<SeedProfile> {
    vec![
        SeedProfile {
            id: "alex_chen",
            money: Decimal::from(47),
            location: "public_library",
            needs: (85, 70, 80),
            preferred_actions: &["write", "code", "blog", "search_wifi"],
            appearance: "Exhausted person in worn hoodie, hunched over old laptop",
            items: &["cracked_laptop", "empty_water_bottle"],
            stream_followers: 120,
        },
        SeedProfile {
            id: "jamie_rodriguez",
            money: Decimal::from(27),
            location: "coffee_shop",
            needs: (60, 80, 75),
            preferred_actions: &["film", "coffee", "network", "edit_video"],
            appearance: "Barista in a stained apron, phone propped up to film",
            items: &["phone_tripod"],
            stream_followers: 1_400,
        },
        SeedProfile {
            id: "maria_gonzalez",
            money: Decimal::from(340),
            location: "hospital",
            needs: (55, 88, 85),
            preferred_actions: &["shift", "childcare", "rest"],
            appearance: "Nurse in faded scrubs, visibly exhausted",
            items: &["hospital_badge", "cheap_phone"],
            stream_followers: 0,
        },
        SeedProfile {
            id: "brittany_torres",
            money: Decimal::from(128),
            location: "street",
            needs: (65, 70, 80),
            preferred_actions: &["gig", "deliver", "drive"],
            appearance: "Gig driver juggling four apps on a cracked phone",
            items: &["car_keys", "phone_mount"],
            stream_followers: 0,
        },
        SeedProfile {
            id: "ashley_kim",
            money: Decimal::from(8_500),
            location: "tech_office",
            needs: (30, 60, 65),
            preferred_actions: &["manage_project", "code", "meeting", "exercise"],
            appearance: "Project manager with a laptop full of stickers",
            items: &["work_laptop"],
            stream_followers: 0,
        },
        SeedProfile {
            id: "tyler_chen",
            money: Decimal::from(45_000),
            location: "tech_office",
            needs: (10, 20, 15),
            preferred_actions: &["code", "invest", "network"],
            appearance: "Well-groomed tech worker in a fleece vest",
            items: &["latest_laptop", "nitro_coldbrew"],
            stream_followers: 0,
        },
        SeedProfile {
            id: "madison_worthington",
            money: Decimal::from(180_000),
            location: "luxury_apartment",
            needs: (5, 10, 10),
            preferred_actions: &["brand", "post", "network"],
            appearance: "Perfectly styled in designer athleisure",
            items: &["newest_phone", "green_juice"],
            stream_followers: 0,
        },
        SeedProfile {
            id: "richard_blackstone",
            money: Decimal::from(25_000_000),
            location: "luxury_apartment",
            needs: (0, 5, 5),
            preferred_actions: &["meeting", "delegate", "acquire"],
            appearance: "Silver-haired man in a bespoke suit, on a call",
            items: &["private_phone"],
            stream_followers: 0,
        },
    ]
}

impl SeedProfile {
    pub fn build(&self, memory_cap: usize) -> Agent {
        let (hunger, exhaustion, stress) = self.needs;
        Agent::new(self.id, self.money, self.location)
            .with_needs(Needs::new(hunger, exhaustion, stress))
            .with_preferred_actions(self.preferred_actions)
            .with_appearance(self.appearance)
            .with_items(self.items)
            .with_followers(self.stream_followers, 0)
            .with_memory_cap(memory_cap)
    }
}

/// Creates an agent for an id that has no stored record or seed profile.
pub fn default_agent(id: &str, memory_cap: usize) -> Agent {
    Agent::new(id, Decimal::from(DEFAULT_MONEY), DEFAULT_LOCATION).with_memory_cap(memory_cap)
}

/// Adds every seed agent to the state.
pub fn spawn_seed_agents(state: &mut SimulationState, memory_cap: usize) -> usize {
    let profiles = seed_profiles();
    for profile in &profiles {
        state.insert_agent(profile.build(memory_cap));
    }
    profiles.len()
}

/// Returns the agent, creating it from a seed profile or the default profile.
pub fn ensure_agent<'a>(state: &'a mut SimulationState, id: &str, memory_cap: usize) -> &'a mut Agent {
    if !state.agents.contains_key(id) {
        let agent = seed_profiles()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.build(memory_cap))
            .unwrap_or_else(|| default_agent(id, memory_cap));
        tracing::info!("Created agent {} at {}", id, agent.location());
        state.insert_agent(agent);
    }
    state
        .agents
        .entry(id.to_string())
        .or_insert_with(|| default_agent(id, memory_cap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_world_map;
    use sim_events::EconomicTier;

    #[test]
    fn test_seed_agents_are_placed_in_registered_locations() {
        let mut state = SimulationState::new(create_world_map(), 6);
        let count = spawn_seed_agents(&mut state, 30);
        assert_eq!(count, 8);
        assert!(state.misplaced_agents().is_empty());
    }

    #[test]
    fn test_seed_cast_covers_every_tier() {
        let tiers: Vec<EconomicTier> = seed_profiles().iter().map(|p| p.build(30).tier()).collect();
        for tier in EconomicTier::all() {
            assert!(tiers.contains(tier), "no seed agent in {}", tier);
        }
    }

    #[test]
    fn test_lazy_default_agent() {
        let mut state = SimulationState::new(create_world_map(), 6);
        let agent = ensure_agent(&mut state, "newcomer", 30);
        assert_eq!(agent.money(), Decimal::from(DEFAULT_MONEY));
        assert_eq!(agent.location(), DEFAULT_LOCATION);
        assert_eq!(agent.needs().hunger(), 75);
        assert_eq!(state.occupancy.count_at(DEFAULT_LOCATION), 1);
    }

    #[test]
    fn test_lazy_seed_agent_uses_profile() {
        let mut state = SimulationState::new(create_world_map(), 6);
        let agent = ensure_agent(&mut state, "alex_chen", 30);
        assert_eq!(agent.money(), Decimal::from(47));
        assert_eq!(agent.needs().hunger(), 85);
    }
}
