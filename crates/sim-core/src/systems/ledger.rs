//! Resource Ledger
//!
//! The single place where money, needs and audience counters change.
//! Every write clamps: needs to 0..=100, counters to >= 0, money to >= 0
//! unless debt is enabled. Deltas are not idempotent; callers apply each
//! mutation exactly once.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::components::agent::{Agent, NeedKind};

/// A numeric field the ledger can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerField {
    Money,
    Need(NeedKind),
    StreamFollowers,
    SocialMediaFollowers,
}

impl From<NeedKind> for LedgerField {
    fn from(kind: NeedKind) -> Self {
        LedgerField::Need(kind)
    }
}

/// Clamping policy for ledger writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Allow money to go below zero
    pub debt_enabled: bool,
}

impl Ledger {
    pub fn new(debt_enabled: bool) -> Self {
        Self { debt_enabled }
    }

    /// Brings a newly admitted agent under the debt policy.
    pub fn admit(&self, agent: &mut Agent) {
        if !self.debt_enabled && agent.money() < Decimal::ZERO {
            agent.set_money(Decimal::ZERO);
        }
    }

    /// Applies `delta` to `field` and returns the new, clamped value.
    pub fn apply_delta(&self, agent: &mut Agent, field: LedgerField, delta: Decimal) -> Decimal {
        match field {
            LedgerField::Money => {
                let mut next = agent.money() + delta;
                if !self.debt_enabled && next < Decimal::ZERO {
                    next = Decimal::ZERO;
                }
                agent.set_money(next);
                next
            }
            LedgerField::Need(kind) => {
                let current = i64::from(agent.needs().get(kind));
                let value = agent.needs_mut().set(kind, current.saturating_add(whole(delta)));
                Decimal::from(value)
            }
            LedgerField::StreamFollowers => {
                let social = agent.social_mut();
                social.stream_followers = shift_counter(social.stream_followers, whole(delta));
                Decimal::from(social.stream_followers)
            }
            LedgerField::SocialMediaFollowers => {
                let social = agent.social_mut();
                social.social_media_followers =
                    shift_counter(social.social_media_followers, whole(delta));
                Decimal::from(social.social_media_followers)
            }
        }
    }

    /// Integer shorthand for needs.
    pub fn adjust_need(&self, agent: &mut Agent, kind: NeedKind, delta: i64) -> u8 {
        let current = i64::from(agent.needs().get(kind));
        agent.needs_mut().set(kind, current + delta)
    }

    /// Moves a need to an absolute value through a delta.
    pub fn set_need(&self, agent: &mut Agent, kind: NeedKind, value: i64) -> u8 {
        let current = i64::from(agent.needs().get(kind));
        self.adjust_need(agent, kind, value - current)
    }

    /// Applies the same delta to all three needs.
    pub fn adjust_all_needs(&self, agent: &mut Agent, delta: i64) {
        for kind in NeedKind::all() {
            self.adjust_need(agent, *kind, delta);
        }
    }

    pub fn adjust_money(&self, agent: &mut Agent, delta: Decimal) -> Decimal {
        self.apply_delta(agent, LedgerField::Money, delta)
    }

    /// Charges up to `amount`. Without debt, never charges more than the
    /// agent holds. Returns the amount actually charged.
    pub fn charge(&self, agent: &mut Agent, amount: Decimal) -> Decimal {
        let charged = if self.debt_enabled {
            amount
        } else {
            amount.min(agent.money()).max(Decimal::ZERO)
        };
        self.adjust_money(agent, -charged);
        charged
    }

    /// Moves money between agents. Returns the amount moved.
    pub fn transfer(&self, from: &mut Agent, to: &mut Agent, amount: Decimal) -> Decimal {
        let moved = self.charge(from, amount);
        self.adjust_money(to, moved);
        moved
    }
}

/// Rounds to a whole step, saturating outside the i64 range.
fn whole(delta: Decimal) -> i64 {
    let rounded = delta.round();
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() { i64::MIN } else { i64::MAX })
}

fn shift_counter(current: u64, delta: i64) -> u64 {
    if delta >= 0 {
        current.saturating_add(delta as u64)
    } else {
        current.saturating_sub(delta.unsigned_abs())
    }
}
