//! Payout Tables
//!
//! Per-category, per-tier outcome data. New tiers or categories need table
//! entries, not code changes in the resolver.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use sim_events::EconomicTier;

use super::ActionCategory;

/// How an outcome changes money.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyChange {
    None,
    Earn(Decimal),
    /// Requires the agent to hold the amount; see `Outcome::unaffordable`
    Pay(Decimal),
    /// Earn a fraction of current money
    Percent(Decimal),
}

/// How an outcome changes one need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedChange {
    By(i64),
    To(i64),
}

/// Data describing what one category does for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub money: MoneyChange,
    pub hunger: Option<NeedChange>,
    pub exhaustion: Option<NeedChange>,
    pub stress: Option<NeedChange>,
    pub stream_followers: i64,
    pub social_media_followers: i64,
    /// Location the agent ends up at, if any
    pub relocate: Option<String>,
    pub summary: String,
    /// Used instead when a `Pay` cannot be covered
    pub unaffordable: Option<Box<Outcome>>,
}

impl Outcome {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            money: MoneyChange::None,
            hunger: None,
            exhaustion: None,
            stress: None,
            stream_followers: 0,
            social_media_followers: 0,
            relocate: None,
            summary: summary.into(),
            unaffordable: None,
        }
    }

    pub fn earn(mut self, amount: Decimal) -> Self {
        self.money = MoneyChange::Earn(amount);
        self
    }

    pub fn pay(mut self, amount: Decimal) -> Self {
        self.money = MoneyChange::Pay(amount);
        self
    }

    pub fn percent(mut self, fraction: Decimal) -> Self {
        self.money = MoneyChange::Percent(fraction);
        self
    }

    pub fn hunger(mut self, change: NeedChange) -> Self {
        self.hunger = Some(change);
        self
    }

    pub fn exhaustion(mut self, change: NeedChange) -> Self {
        self.exhaustion = Some(change);
        self
    }

    pub fn stress(mut self, change: NeedChange) -> Self {
        self.stress = Some(change);
        self
    }

    pub fn stream_followers(mut self, delta: i64) -> Self {
        self.stream_followers = delta;
        self
    }

    pub fn relocate(mut self, location: impl Into<String>) -> Self {
        self.relocate = Some(location.into());
        self
    }

    pub fn or_else(mut self, fallback: Outcome) -> Self {
        self.unaffordable = Some(Box::new(fallback));
        self
    }

    /// True if the outcome touches money or at least one need.
    pub fn changes_state(&self) -> bool {
        !matches!(self.money, MoneyChange::None)
            || self.hunger.is_some()
            || self.exhaustion.is_some()
            || self.stress.is_some()
    }
}

fn d(units: i64) -> Decimal {
    Decimal::from(units)
}

/// Lookup table of outcomes by (category, tier).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayoutTable {
    entries: BTreeMap<(ActionCategory, EconomicTier), Outcome>,
}

impl PayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, category: ActionCategory, tier: EconomicTier, outcome: Outcome) {
        self.entries.insert((category, tier), outcome);
    }

    /// Sets the same outcome for several tiers.
    pub fn set_tiers(&mut self, category: ActionCategory, tiers: &[EconomicTier], outcome: Outcome) {
        for tier in tiers {
            self.set(category, *tier, outcome.clone());
        }
    }

    /// Outcome for a category and tier, falling back to the unknown entry.
    pub fn get(&self, category: ActionCategory, tier: EconomicTier) -> Option<&Outcome> {
        self.entries
            .get(&(category, tier))
            .or_else(|| self.entries.get(&(ActionCategory::Unknown, tier)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The standard city economy.
    pub fn standard() -> Self {
        use ActionCategory::*;
        use EconomicTier::*;
        use NeedChange::{By, To};

        let affluent = [Wealthy, UltraWealthy];
        let comfortable = [Middle, Wealthy, UltraWealthy];
        let mut table = Self::new();

        // Food
        table.set(
            Food,
            Poor,
            Outcome::new("Bought something cheap to eat")
                .pay(d(5))
                .hunger(By(-30))
                .or_else(
                    Outcome::new("Waited in line at the food bank")
                        .hunger(By(-20))
                        .relocate("food_bank"),
                ),
        );
        table.set(Food, Middle, Outcome::new("Bought a decent meal").pay(d(15)).hunger(To(0)));
        table.set_tiers(
            Food,
            &affluent,
            Outcome::new("Had a catered meal").pay(d(45)).hunger(To(0)),
        );

        // Work
        table.set(
            Work,
            Poor,
            Outcome::new("Earned $6.47 from gig work")
                .earn(Decimal::new(647, 2))
                .exhaustion(By(10)),
        );
        table.set(
            Work,
            Middle,
            Outcome::new("Worked a full shift").earn(d(240)).exhaustion(By(5)),
        );
        table.set_tiers(
            Work,
            &affluent,
            Outcome::new("Billed a few hours of consulting").earn(d(2000)).stress(By(-2)),
        );

        // Rest
        table.set(
            Rest,
            Poor,
            Outcome::new("Rested where nobody moved them along")
                .exhaustion(By(-15))
                .stress(By(-10)),
        );
        table.set_tiers(
            Rest,
            &comfortable,
            Outcome::new("Slept well in a real bed")
                .exhaustion(To(0))
                .stress(By(-20)),
        );

        // Invest
        table.set(Invest, Poor, Outcome::new("No money to invest").stress(By(5)));
        table.set(Invest, Middle, Outcome::new("Moved a little into savings").earn(d(5)));
        table.set_tiers(
            Invest,
            &affluent,
            Outcome::new("Portfolio ticked up").percent(Decimal::new(2, 3)),
        );

        // Social
        table.set_tiers(
            Social,
            &[Poor, Middle],
            Outcome::new("No access to that crowd").stress(By(5)),
        );
        table.set_tiers(
            Social,
            &affluent,
            Outcome::new("Networked over expensive drinks").pay(d(50)).stress(By(-10)),
        );

        // Content
        table.set(
            Content,
            Poor,
            Outcome::new("Published a post and got $3.50 in tips")
                .earn(Decimal::new(350, 2))
                .exhaustion(By(5)),
        );
        table.set_tiers(
            Content,
            &comfortable,
            Outcome::new("Published sponsored content").earn(d(50)),
        );

        // Stream
        table.set(
            Stream,
            Poor,
            Outcome::new("Streamed and picked up a few followers and tips")
                .earn(d(5))
                .stream_followers(15),
        );
        table.set_tiers(
            Stream,
            &comfortable,
            Outcome::new("Streamed for fun")
                .stream_followers(5)
                .stress(By(-2)),
        );

        // Organize
        table.set_tiers(
            Organize,
            EconomicTier::all(),
            Outcome::new("Joined the rent strike").stress(By(-10)),
        );

        // Tool base cost; tool effects are applied on top
        table.set_tiers(
            Tool,
            EconomicTier::all(),
            Outcome::new("Used a tool").exhaustion(By(2)),
        );

        // Survive
        table.set(Unknown, Poor, Outcome::new("Survived another hour").stress(By(2)));
        table.set(Unknown, Middle, Outcome::new("Got through the day").stress(By(-2)));
        table.set_tiers(Unknown, &affluent, Outcome::new("Enjoyed the afternoon").stress(By(-2)));

        table
    }
}
