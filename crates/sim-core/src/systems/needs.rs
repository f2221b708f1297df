//! Needs System
//!
//! End-of-turn drift: scarcity wears agents down, comfort restores them.

use rust_decimal::Decimal;

use crate::components::agent::{Agent, NeedKind};
use crate::systems::ledger::Ledger;

/// Drift constants
pub mod drift {
    /// Below this much money an agent is in scarcity
    pub const SCARCITY_MONEY: i64 = 100;
    pub const SCARCITY_HUNGER: i64 = 5;
    pub const SCARCITY_EXHAUSTION: i64 = 3;
    pub const SCARCITY_STRESS: i64 = 2;
    pub const COMFORT_HUNGER: i64 = -5;
    pub const COMFORT_EXHAUSTION: i64 = -10;
    pub const COMFORT_STRESS: i64 = -5;
}

/// Applies one turn of need drift.
pub fn update_needs(ledger: &Ledger, agent: &mut Agent) {
    let (hunger, exhaustion, stress) = if agent.money() < Decimal::from(drift::SCARCITY_MONEY) {
        (drift::SCARCITY_HUNGER, drift::SCARCITY_EXHAUSTION, drift::SCARCITY_STRESS)
    } else {
        (drift::COMFORT_HUNGER, drift::COMFORT_EXHAUSTION, drift::COMFORT_STRESS)
    };
    ledger.adjust_need(agent, NeedKind::Hunger, hunger);
    ledger.adjust_need(agent, NeedKind::Exhaustion, exhaustion);
    ledger.adjust_need(agent, NeedKind::Stress, stress);
}
