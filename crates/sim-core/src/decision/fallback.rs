//! Fallback Decisions
//!
//! Deterministic-given-seed rule table. Candidates are assembled from need
//! thresholds, money, time of day and tier, then one is drawn by weighted
//! random choice. Actions the agent did recently are drawn less often.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use sim_events::{Decision, EconomicTier, Urgency};

use crate::actions::tools::names as tools;
use crate::components::agent::Agent;
use crate::systems::perception::Perception;

use super::DecisionProvider;

/// Rule thresholds and weights
pub mod fallback_weights {
    /// Above this only food is considered, led by a desperate search
    pub const DESPERATE_HUNGER: u8 = 90;
    /// At or above this only food is considered
    pub const FOOD_ONLY_HUNGER: u8 = 80;
    /// Above this food joins the candidate list
    pub const HUNGRY: u8 = 70;
    pub const EXHAUSTED: u8 = 85;
    pub const LOW_MONEY: i64 = 50;
    /// Enough for the cheapest meal
    pub const CHEAP_FOOD_MONEY: i64 = 10;
    pub const SOCIAL_CHANCE: f32 = 0.3;
    /// Multiplier for candidates found in recent memories
    pub const REPEAT_PENALTY: f32 = 0.25;

    pub const DESPERATE_FOOD: f32 = 100.0;
    pub const FOOD: f32 = 80.0;
    pub const FREE_FOOD: f32 = 60.0;
    pub const REST: f32 = 70.0;
    pub const STREAM: f32 = 60.0;
    pub const GIG: f32 = 50.0;
    pub const CROWDFUND: f32 = 40.0;
    pub const NIGHT_SHELTER: f32 = 40.0;
    pub const WORK: f32 = 35.0;
    pub const SOCIAL: f32 = 30.0;
    pub const FLAVOR: f32 = 25.0;
    pub const SURVIVE: f32 = 10.0;
}

use fallback_weights as w;

/// A weighted option for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub decision: Decision,
    pub weight: f32,
    /// Dropped outright, not just penalized, when recently done
    pub skip_if_recent: bool,
}

impl Candidate {
    pub fn new(action: impl Into<String>, urgency: Urgency, weight: f32) -> Self {
        Self {
            decision: Decision::new(action, "", "", urgency),
            weight,
            skip_if_recent: false,
        }
    }

    pub fn feeling(mut self, emotion: &str, reasoning: &str) -> Self {
        self.decision.emotion = emotion.to_string();
        self.decision.reasoning = reasoning.to_string();
        self
    }

    pub fn tool(mut self, tool: &str) -> Self {
        self.decision = self.decision.with_tool(tool);
        self
    }

    fn skippable(mut self) -> Self {
        self.skip_if_recent = true;
        self
    }

    fn seen_in(&self, recent: &[String]) -> bool {
        recent.iter().any(|m| m.contains(&self.decision.action))
    }
}

fn food_candidates(agent: &Agent, perception: &Perception) -> Vec<Candidate> {
    let mut found = Vec::new();
    if agent.money() > rust_decimal::Decimal::from(w::CHEAP_FOOD_MONEY) {
        found.push(
            Candidate::new("buy_cheap_food", Urgency::High, w::FOOD)
                .feeling("hungry", "Need to eat something, anything cheap"),
        );
    } else {
        found.push(
            Candidate::new("visit_food_bank", Urgency::High, w::FOOD)
                .feeling("ashamed", "Can't afford food, the food bank is the only option"),
        );
    }
    if perception.has_resource("free_food") {
        found.push(
            Candidate::new("eat_whatever_is_free", Urgency::High, w::FREE_FOOD)
                .feeling("relieved", "There is free food here"),
        );
    }
    found
}

fn tier_flavor(agent: &Agent, perception: &Perception) -> Vec<Candidate> {
    let hour = perception.hour;
    match agent.tier() {
        EconomicTier::Poor => Vec::new(),
        EconomicTier::Middle => {
            let lunch = if (11..=13).contains(&hour) { w::FLAVOR + 10.0 } else { w::FLAVOR - 15.0 };
            vec![
                Candidate::new("buy_lunch", Urgency::Low, lunch).feeling("content", "Time for lunch"),
                Candidate::new("work_on_project", Urgency::Medium, w::FLAVOR)
                    .feeling("focused", "Deadlines are coming"),
                Candidate::new("manage_finances", Urgency::Low, w::FLAVOR - 10.0)
                    .feeling("careful", "Checking the budget"),
            ]
        }
        EconomicTier::Wealthy => {
            let (action, reasoning) = if hour < 10 {
                ("morning_routine", "Yoga, smoothie, journaling")
            } else if hour < 17 {
                ("check_investments", "Keep an eye on the portfolio")
            } else {
                ("network_socially", "Drinks with people who matter")
            };
            vec![Candidate::new(action, Urgency::Low, w::FLAVOR).feeling("content", reasoning)]
        }
        EconomicTier::UltraWealthy => vec![
            Candidate::new("review_portfolio", Urgency::Low, w::FLAVOR)
                .feeling("bored", "Another quarter, another gain"),
            Candidate::new("plan_vacation", Urgency::None, w::FLAVOR - 10.0)
                .feeling("indifferent", "Somewhere warm"),
            Candidate::new("ignore_problems", Urgency::None, w::FLAVOR - 10.0)
                .feeling("indifferent", "Not my concern"),
            Candidate::new("post_on_social_media", Urgency::Low, w::FLAVOR - 10.0)
                .feeling("smug", "Share some thoughts on hustle"),
        ],
    }
}

/// Builds the weighted candidate list for one agent.
///
/// Never returns an empty list.
pub fn assemble_candidates<R: Rng>(
    agent: &Agent,
    perception: &Perception,
    recent_memories: &[String],
    rng: &mut R,
) -> Vec<Candidate> {
    let needs = agent.needs();
    let mut candidates = Vec::new();

    if needs.hunger() > w::DESPERATE_HUNGER {
        candidates.push(
            Candidate::new("desperately_search_for_food", Urgency::Immediate, w::DESPERATE_FOOD)
                .feeling("desperate", "Starving, must find food now"),
        );
        candidates.extend(food_candidates(agent, perception));
        return penalize_repeats(candidates, recent_memories);
    }
    if needs.hunger() >= w::FOOD_ONLY_HUNGER {
        return penalize_repeats(food_candidates(agent, perception), recent_memories);
    }

    if needs.hunger() > w::HUNGRY {
        candidates.extend(food_candidates(agent, perception));
    }

    if needs.exhaustion() > w::EXHAUSTED {
        let action = if perception.location_id == "public_library" {
            "nap_in_library_corner"
        } else {
            "find_place_to_rest"
        };
        candidates.push(
            Candidate::new(action, Urgency::High, w::REST).feeling("exhausted", "Can barely keep my eyes open"),
        );
    }

    if agent.money() < rust_decimal::Decimal::from(w::LOW_MONEY) {
        candidates.push(
            Candidate::new("stream_for_donations", Urgency::High, w::STREAM)
                .tool(tools::ASK_VIEWERS_FOR_HELP)
                .feeling("hopeful", "Maybe the viewers can help")
                .skippable(),
        );
        candidates.push(
            Candidate::new("post_crowdfunding_update", Urgency::Medium, w::CROWDFUND)
                .tool(tools::CHECK_CROWDFUNDING)
                .feeling("anxious", "Update the fundraiser")
                .skippable(),
        );
        candidates.push(
            Candidate::new("freelance_gig_search", Urgency::High, w::GIG)
                .feeling("anxious", "Need money, any gig will do")
                .skippable(),
        );
    }

    if !perception.others_present.is_empty() && rng.gen::<f32>() < w::SOCIAL_CHANCE {
        if let Some(other) = perception.others_present.choose(rng) {
            candidates.push(
                Candidate::new(format!("interact_with_{}", other.id), Urgency::Low, w::SOCIAL)
                    .feeling("curious", "Someone else is here"),
            );
        }
    }

    if perception.is_night {
        candidates.push(
            Candidate::new("find_safe_sleeping_spot", Urgency::Medium, w::NIGHT_SHELTER)
                .feeling("wary", "It's getting late"),
        );
    }

    if perception.is_work_hours {
        if let Some(preferred) = agent.preferred_actions.choose(rng) {
            candidates.push(
                Candidate::new(format!("work_on_{}", preferred), Urgency::Medium, w::WORK)
                    .feeling("focused", "Get something done"),
            );
        }
    }

    candidates.extend(tier_flavor(agent, perception));

    let candidates = penalize_repeats(candidates, recent_memories);
    if candidates.is_empty() {
        return vec![Candidate::new("survive_another_hour", Urgency::Low, w::SURVIVE)
            .feeling("numb", "Just get through the next hour")];
    }
    candidates
}

/// Drops skippable repeats if anything else remains, then down-weights
/// whatever repeats are left.
fn penalize_repeats(candidates: Vec<Candidate>, recent: &[String]) -> Vec<Candidate> {
    let kept: Vec<Candidate> = candidates
        .iter()
        .filter(|c| !(c.skip_if_recent && c.seen_in(recent)))
        .cloned()
        .collect();
    let mut candidates = if kept.is_empty() { candidates } else { kept };
    for candidate in candidates.iter_mut() {
        if candidate.seen_in(recent) {
            candidate.weight *= w::REPEAT_PENALTY;
        }
    }
    candidates
}

/// Weighted random selection.
pub fn weighted_choice<'a, R: Rng>(rng: &mut R, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
    let total_weight: f32 = candidates.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return candidates.first();
    }

    let mut roll: f32 = rng.gen::<f32>() * total_weight;
    for candidate in candidates {
        roll -= candidate.weight;
        if roll <= 0.0 {
            return Some(candidate);
        }
    }
    candidates.last()
}

/// Rule-table provider with its own seeded rng.
#[derive(Debug, Clone)]
pub struct FallbackProvider {
    rng: SmallRng,
}

impl FallbackProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_rng(rng: SmallRng) -> Self {
        Self { rng }
    }
}

impl DecisionProvider for FallbackProvider {
    fn decide(&mut self, agent: &Agent, perception: &Perception, recent_memories: &[String]) -> Decision {
        let candidates = assemble_candidates(agent, perception, recent_memories, &mut self.rng);
        match weighted_choice(&mut self.rng, &candidates) {
            Some(chosen) => chosen.decision.clone(),
            None => Decision::new("survive_another_hour", "", "numb", Urgency::Low),
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
