//! Action Resolution
//!
//! Turns a decision into concrete state changes. Every path changes money or
//! at least one need and leaves exactly one memory behind.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sim_events::{Decision, EconomicTier, Urgency};

use crate::components::agent::{Agent, NeedKind};
use crate::output::content::{content_type_for, ContentPublisher, PlaceholderPublisher};
use crate::simulation::TurnError;
use crate::state::SimulationState;
use crate::systems::ledger::{Ledger, LedgerField};

use super::payouts::{MoneyChange, NeedChange, Outcome, PayoutTable};
use super::tools::{StubToolExecutor, ToolExecutor, ToolMenu};
use super::{classify_decision, ActionCategory};

/// Adjustments applied after the category outcome
pub mod adjustments {
    /// Stress added for an immediate-urgency decision
    pub const IMMEDIATE_STRESS: i64 = 10;
    /// Stress relieved for a low or no-urgency decision
    pub const CALM_STRESS: i64 = -5;
    /// Applied to every need for wealthy and ultra wealthy agents
    pub const AFFLUENT_NEEDS: i64 = -5;
    /// Stress added when a tool is outside the agent's menu
    pub const TOOL_DENIED_STRESS: i64 = 2;
}

/// What happened to one agent this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub agent_id: String,
    pub action: String,
    pub category: ActionCategory,
    pub summary: String,
    pub money_before: Decimal,
    pub money_after: Decimal,
    pub location: String,
    #[serde(default)]
    pub content_path: Option<String>,
}

impl Resolution {
    pub fn money_delta(&self) -> Decimal {
        self.money_after - self.money_before
    }
}

/// Applies decisions using a payout table and the tool and content stubs.
pub struct ActionResolver {
    table: PayoutTable,
    tools: Box<dyn ToolExecutor>,
    publisher: Box<dyn ContentPublisher>,
}

impl Default for ActionResolver {
    fn default() -> Self {
        Self::new(PayoutTable::standard())
    }
}

impl ActionResolver {
    pub fn new(table: PayoutTable) -> Self {
        Self {
            table,
            tools: Box::new(StubToolExecutor::new()),
            publisher: Box::new(PlaceholderPublisher::new()),
        }
    }

    pub fn with_tools(mut self, tools: Box<dyn ToolExecutor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_publisher(mut self, publisher: Box<dyn ContentPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn table(&self) -> &PayoutTable {
        &self.table
    }

    /// Resolves one decision against the live state.
    ///
    /// A requested relocation happens first; if the target is unknown the
    /// whole turn fails with no changes.
    pub fn resolve(
        &mut self,
        state: &mut SimulationState,
        agent_id: &str,
        decision: &Decision,
    ) -> Result<Resolution, TurnError> {
        let clock = state.world.clock;
        let ledger = state.ledger;

        let Some(agent) = state.agents.get(agent_id) else {
            return Err(TurnError::AgentMissing(agent_id.to_string()));
        };
        let money_before = agent.money();
        let tier = agent.tier();

        if let Some(target) = decision.move_to.as_deref() {
            if target != agent.location() {
                state.move_agent(agent_id, target)?;
            }
        }

        let category = classify_decision(decision);
        let outcome = self.outcome_for(category, tier, money_before, ledger);
        let mut notes: Vec<String> = Vec::new();
        let mut content_path = None;

        // Category side effects that need more than the agent record
        match category {
            ActionCategory::Tool => {
                if let Some(note) = self.run_tool(state, agent_id, decision, tier)? {
                    notes.push(note);
                }
            }
            ActionCategory::Content => {
                let content_type = content_type_for(&decision.action);
                let path = self
                    .publisher
                    .publish(agent_id, content_type, &decision.reasoning);
                notes.push(format!("saved to {}", path));
                content_path = Some(path);
            }
            ActionCategory::Organize => {
                if state.world.events.join_rent_strike(agent_id) {
                    tracing::info!("{} joined the rent strike", agent_id);
                }
            }
            _ => {}
        }

        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| TurnError::AgentMissing(agent_id.to_string()))?;
        apply_outcome(&ledger, agent, &outcome);
        apply_urgency(&ledger, agent, decision.urgency);
        if tier.is_affluent() {
            ledger.adjust_all_needs(agent, adjustments::AFFLUENT_NEEDS);
        }

        let mut summary = outcome.summary.clone();
        for note in &notes {
            summary.push_str("; ");
            summary.push_str(note);
        }
        agent.remember(&clock, &decision.action, &summary);
        agent.last_emotion = decision.emotion.clone();
        let money_after = agent.money();

        if let Some(target) = outcome.relocate.as_deref() {
            if let Err(e) = state.move_agent(agent_id, target) {
                tracing::warn!("{} could not be relocated: {}", agent_id, e);
            }
        }

        let location = state
            .agent(agent_id)
            .map(|a| a.location().to_string())
            .unwrap_or_default();

        tracing::debug!(
            "{} resolved {} as {} ({} -> {})",
            agent_id,
            decision.action,
            category,
            money_before,
            money_after
        );

        Ok(Resolution {
            agent_id: agent_id.to_string(),
            action: decision.action.clone(),
            category,
            summary,
            money_before,
            money_after,
            location,
            content_path,
        })
    }

    /// Table outcome, swapped for its fallback when a payment can't be covered.
    fn outcome_for(
        &self,
        category: ActionCategory,
        tier: EconomicTier,
        money: Decimal,
        ledger: Ledger,
    ) -> Outcome {
        let Some(outcome) = self.table.get(category, tier) else {
            return survive(tier);
        };
        if let MoneyChange::Pay(amount) = outcome.money {
            if money < amount && !ledger.debt_enabled {
                if let Some(fallback) = &outcome.unaffordable {
                    return fallback.as_ref().clone();
                }
            }
        }
        outcome.clone()
    }

    fn run_tool(
        &mut self,
        state: &mut SimulationState,
        agent_id: &str,
        decision: &Decision,
        tier: EconomicTier,
    ) -> Result<Option<String>, TurnError> {
        let Some(tool) = decision.target_tool.as_deref() else {
            return Ok(None);
        };
        let ledger = state.ledger;

        if !ToolMenu::for_tier(tier).allows(tool) {
            tracing::debug!("{} asked for {} outside the {} menu", agent_id, tool, tier);
            let agent = state
                .agents
                .get_mut(agent_id)
                .ok_or_else(|| TurnError::AgentMissing(agent_id.to_string()))?;
            ledger.adjust_need(agent, NeedKind::Stress, adjustments::TOOL_DENIED_STRESS);
            return Ok(Some(format!("{} is out of reach", tool)));
        }

        let result = {
            let agent = state
                .agent(agent_id)
                .ok_or_else(|| TurnError::AgentMissing(agent_id.to_string()))?;
            self.tools.execute(tool, &decision.tool_args, agent)
        };
        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| TurnError::AgentMissing(agent_id.to_string()))?;
        for (field, delta) in &result.effects {
            ledger.apply_delta(agent, *field, *delta);
        }
        Ok(Some(result.text))
    }
}

/// Default when the table has nothing for a tier.
fn survive(tier: EconomicTier) -> Outcome {
    let stress = if tier.is_poor() { 2 } else { -2 };
    Outcome::new("Survived another hour").stress(NeedChange::By(stress))
}

fn apply_need(ledger: &Ledger, agent: &mut Agent, kind: NeedKind, change: Option<NeedChange>) {
    match change {
        Some(NeedChange::By(delta)) => {
            ledger.adjust_need(agent, kind, delta);
        }
        Some(NeedChange::To(value)) => {
            ledger.set_need(agent, kind, value);
        }
        None => {}
    }
}

fn apply_outcome(ledger: &Ledger, agent: &mut Agent, outcome: &Outcome) {
    match outcome.money {
        MoneyChange::None => {}
        MoneyChange::Earn(amount) => {
            ledger.adjust_money(agent, amount);
        }
        MoneyChange::Pay(amount) => {
            ledger.charge(agent, amount);
        }
        MoneyChange::Percent(fraction) => {
            let gain = (agent.money() * fraction).round_dp(2);
            ledger.adjust_money(agent, gain);
        }
    }
    apply_need(ledger, agent, NeedKind::Hunger, outcome.hunger);
    apply_need(ledger, agent, NeedKind::Exhaustion, outcome.exhaustion);
    apply_need(ledger, agent, NeedKind::Stress, outcome.stress);

    if outcome.stream_followers != 0 {
        ledger.apply_delta(
            agent,
            LedgerField::StreamFollowers,
            Decimal::from(outcome.stream_followers),
        );
    }
    if outcome.social_media_followers != 0 {
        ledger.apply_delta(
            agent,
            LedgerField::SocialMediaFollowers,
            Decimal::from(outcome.social_media_followers),
        );
    }
}

fn apply_urgency(ledger: &Ledger, agent: &mut Agent, urgency: Urgency) {
    match urgency {
        Urgency::Immediate => {
            ledger.adjust_need(agent, NeedKind::Stress, adjustments::IMMEDIATE_STRESS);
        }
        Urgency::Low | Urgency::None => {
            ledger.adjust_need(agent, NeedKind::Stress, adjustments::CALM_STRESS);
        }
        Urgency::High | Urgency::Medium => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::Needs;
    use crate::setup::create_world_map;

    fn state_with(agent: Agent) -> SimulationState {
        let mut state = SimulationState::new(create_world_map(), 6);
        state.insert_agent(agent);
        state
    }

    fn alex(money: i64) -> Agent {
        Agent::new("alex_chen", Decimal::from(money), "public_library")
            .with_needs(Needs::new(85, 70, 80))
    }

    #[test]
    fn test_poor_agent_buys_cheap_food() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("buy_cheap_food", "starving", "desperate", Urgency::High);

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        let agent = state.agent("alex_chen").unwrap();

        assert_eq!(res.category, ActionCategory::Food);
        assert_eq!(agent.money(), Decimal::from(42));
        assert_eq!(agent.needs().hunger(), 55);
        assert_eq!(agent.memories.len(), 1);
        assert_eq!(agent.last_emotion, "desperate");
    }

    #[test]
    fn test_broke_agent_goes_to_food_bank() {
        let mut state = state_with(alex(3));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("buy_cheap_food", "starving", "desperate", Urgency::High);

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        let agent = state.agent("alex_chen").unwrap();

        assert_eq!(agent.money(), Decimal::from(3));
        assert_eq!(agent.needs().hunger(), 65);
        assert_eq!(res.location, "food_bank");
        assert_eq!(state.occupancy.count_at("food_bank"), 1);
    }

    #[test]
    fn test_poor_gig_work_pays_cents() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("freelance_gig_search", "rent", "anxious", Urgency::Medium);

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert_eq!(res.money_delta(), Decimal::new(647, 2));
        assert_eq!(state.agent("alex_chen").unwrap().needs().exhaustion(), 80);
    }

    #[test]
    fn test_affluent_needs_drop_after_any_action() {
        let tyler = Agent::new("tyler_chen", Decimal::from(45_000), "tech_office")
            .with_needs(Needs::new(20, 20, 20));
        let mut state = state_with(tyler);
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("check_investments", "routine", "calm", Urgency::Medium);

        let res = resolver.resolve(&mut state, "tyler_chen", &decision).unwrap();
        let agent = state.agent("tyler_chen").unwrap();

        assert_eq!(res.category, ActionCategory::Invest);
        assert_eq!(res.money_delta(), Decimal::from(90));
        assert_eq!(agent.needs().hunger(), 15);
        assert_eq!(agent.needs().stress(), 15);
    }

    #[test]
    fn test_unknown_action_survives() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("stare_at_ceiling", "", "numb", Urgency::Medium);

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert_eq!(res.category, ActionCategory::Unknown);
        assert_eq!(state.agent("alex_chen").unwrap().needs().stress(), 82);
    }

    #[test]
    fn test_urgency_adjusts_stress() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();

        let decision = Decision::new("stare_at_ceiling", "", "numb", Urgency::Immediate);
        resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert_eq!(state.agent("alex_chen").unwrap().needs().stress(), 92);

        let decision = Decision::new("stare_at_ceiling", "", "numb", Urgency::Low);
        resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert_eq!(state.agent("alex_chen").unwrap().needs().stress(), 89);
    }

    #[test]
    fn test_unknown_move_target_changes_nothing() {
        let mut state = state_with(alex(47));
        let before = state.clone();
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("buy_cheap_food", "", "", Urgency::High).with_move_to("moon");

        let err = resolver.resolve(&mut state, "alex_chen", &decision).unwrap_err();
        assert!(matches!(err, TurnError::UnknownLocation(_)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_move_then_act() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("visit_food_bank", "", "", Urgency::High).with_move_to("food_bank");

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert_eq!(res.location, "food_bank");
    }

    #[test]
    fn test_missing_agent_is_an_error() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("rest", "", "", Urgency::Medium);
        let err = resolver.resolve(&mut state, "nobody", &decision).unwrap_err();
        assert!(matches!(err, TurnError::AgentMissing(_)));
    }

    #[test]
    fn test_tool_effects_apply_through_ledger() {
        let mut state = state_with(alex(30));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("stream_for_donations", "", "hopeful", Urgency::High)
            .with_tool("ask_viewers_for_help");

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        let agent = state.agent("alex_chen").unwrap();
        assert_eq!(res.category, ActionCategory::Tool);
        assert_eq!(agent.money(), Decimal::from(40));
        assert_eq!(agent.needs().exhaustion(), 72);
        assert!(res.summary.contains("Viewers sent"));
    }

    #[test]
    fn test_tool_outside_menu_is_refused() {
        let mut state = state_with(alex(30));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("trade", "", "", Urgency::Medium).with_tool("finance");

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert!(res.summary.contains("out of reach"));
        assert_eq!(state.agent("alex_chen").unwrap().money(), Decimal::from(30));
    }

    #[test]
    fn test_content_records_placeholder_path() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("write_blog_post", "share the story", "determined", Urgency::Medium);

        let res = resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert_eq!(
            res.content_path.as_deref(),
            Some("content/alex_chen/blog_0001.md")
        );
        let memory = state.agent("alex_chen").unwrap().memories.last().unwrap();
        assert!(memory.text.contains("content/alex_chen/blog_0001.md"));
    }

    #[test]
    fn test_organize_joins_rent_strike() {
        let mut state = state_with(alex(47));
        let mut resolver = ActionResolver::default();
        let decision = Decision::new("organize_rent_strike", "", "angry", Urgency::Medium);

        resolver.resolve(&mut state, "alex_chen", &decision).unwrap();
        assert!(state.world.events.rent_strike.contains("alex_chen"));
    }

    #[test]
    fn test_every_category_leaves_one_memory_and_valid_needs() {
        let actions = [
            "buy_cheap_food",
            "freelance_gig_search",
            "find_place_to_rest",
            "check_investments",
            "network_socially",
            "write_blog_post",
            "stream_for_donations",
            "organize_rent_strike",
            "survive_another_hour",
        ];
        for money in [0, 47, 5_000, 2_000_000] {
            for action in actions {
                let agent = Agent::new("a", Decimal::from(money), "street");
                let mut state = state_with(agent);
                let mut resolver = ActionResolver::default();
                let decision = Decision::new(action, "", "", Urgency::Medium);
                resolver.resolve(&mut state, "a", &decision).unwrap();

                let agent = state.agent("a").unwrap();
                assert_eq!(agent.memories.len(), 1, "{} at {}", action, money);
                assert!(agent.money() >= Decimal::ZERO);
                for kind in NeedKind::all() {
                    assert!(agent.needs().get(*kind) <= 100);
                }
            }
        }
    }
}
