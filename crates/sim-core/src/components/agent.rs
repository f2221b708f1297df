//! Agent Components
//!
//! Per-agent state: money, needs, location, inventory, memories, counters.
//!
//! Money, needs and counters are only changed through
//! [`crate::systems::ledger::Ledger`]; the setters here are crate-private.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use sim_events::{EconomicTier, WorldClock};

/// Default memory cap when none is configured.
pub const DEFAULT_MEMORY_CAP: usize = 30;

/// Upper bound for every need.
pub const NEED_MAX: u8 = 100;

/// The three tracked needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    Hunger,
    Exhaustion,
    Stress,
}

impl NeedKind {
    pub fn all() -> &'static [NeedKind] {
        &[NeedKind::Hunger, NeedKind::Exhaustion, NeedKind::Stress]
    }
}

impl fmt::Display for NeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeedKind::Hunger => write!(f, "hunger"),
            NeedKind::Exhaustion => write!(f, "exhaustion"),
            NeedKind::Stress => write!(f, "stress"),
        }
    }
}

/// Needs, each in 0..=100. Higher is worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Needs {
    hunger: u8,
    exhaustion: u8,
    stress: u8,
}

impl Needs {
    /// Creates needs, clamping each value into range.
    pub fn new(hunger: i64, exhaustion: i64, stress: i64) -> Self {
        Self {
            hunger: clamp_need(hunger),
            exhaustion: clamp_need(exhaustion),
            stress: clamp_need(stress),
        }
    }

    /// Default needs for an agent created without a profile.
    pub fn default_for_money(money: Decimal) -> Self {
        if money > Decimal::from(10_000) {
            Self::new(10, 0, 5)
        } else {
            Self::new(75, 85, 90)
        }
    }

    pub fn get(&self, kind: NeedKind) -> u8 {
        match kind {
            NeedKind::Hunger => self.hunger,
            NeedKind::Exhaustion => self.exhaustion,
            NeedKind::Stress => self.stress,
        }
    }

    pub fn hunger(&self) -> u8 {
        self.hunger
    }

    pub fn exhaustion(&self) -> u8 {
        self.exhaustion
    }

    pub fn stress(&self) -> u8 {
        self.stress
    }

    pub(crate) fn set(&mut self, kind: NeedKind, value: i64) -> u8 {
        let clamped = clamp_need(value);
        match kind {
            NeedKind::Hunger => self.hunger = clamped,
            NeedKind::Exhaustion => self.exhaustion = clamped,
            NeedKind::Stress => self.stress = clamped,
        }
        clamped
    }
}

impl Default for Needs {
    fn default() -> Self {
        Self::new(50, 50, 50)
    }
}

fn clamp_need(value: i64) -> u8 {
    value.clamp(0, i64::from(NEED_MAX)) as u8
}

/// Audience counters. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SocialCounters {
    pub stream_followers: u64,
    pub social_media_followers: u64,
}

/// A single remembered event, e.g. "[06:30am] visit_food_bank: Waited 45 minutes".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub turn: u64,
    pub stamp: String,
    pub text: String,
}

impl fmt::Display for MemoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stamp, self.text)
    }
}

/// Append-only memory sequence bounded by `cap` (oldest evicted first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLog {
    entries: VecDeque<MemoryEntry>,
    cap: usize,
}

impl MemoryLog {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, clock: &WorldClock, text: impl Into<String>) {
        self.entries.push_back(MemoryEntry {
            turn: clock.turn,
            stamp: clock.stamp(),
            text: text.into(),
        });
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// The most recent `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&MemoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    /// Most recent `n` entries rendered as strings.
    pub fn recent_lines(&self, n: usize) -> Vec<String> {
        self.recent(n).iter().map(|m| m.to_string()).collect()
    }

    pub fn last(&self) -> Option<&MemoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Changes the cap, evicting the oldest entries if needed.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.max(1);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAP)
    }
}

/// A simulated character.
///
/// Relationships are not stored here; see [`crate::components::social::RelationshipGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    money: Decimal,
    needs: Needs,
    location: String,
    pub inventory: BTreeSet<String>,
    pub memories: MemoryLog,
    social: SocialCounters,
    /// Preferred work activities, used for work-hours decisions
    pub preferred_actions: Vec<String>,
    /// Coarse public description seen by others
    pub appearance: String,
    /// Emotion label from the last decision; descriptive only
    pub last_emotion: String,
}

impl Agent {
    /// Money is taken as given; the ledger applies the debt policy when the
    /// agent enters a state.
    pub fn new(id: impl Into<String>, money: Decimal, location: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.replace('_', " "),
            id,
            money,
            needs: Needs::default_for_money(money),
            location: location.into(),
            inventory: BTreeSet::new(),
            memories: MemoryLog::default(),
            social: SocialCounters::default(),
            preferred_actions: vec!["work".to_string(), "rest".to_string()],
            appearance: "Another person".to_string(),
            last_emotion: "neutral".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_needs(mut self, needs: Needs) -> Self {
        self.needs = needs;
        self
    }

    pub fn with_preferred_actions(mut self, actions: &[&str]) -> Self {
        self.preferred_actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_appearance(mut self, appearance: impl Into<String>) -> Self {
        self.appearance = appearance.into();
        self
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.inventory.extend(items.iter().map(|i| i.to_string()));
        self
    }

    pub fn with_followers(mut self, stream: u64, social: u64) -> Self {
        self.social = SocialCounters {
            stream_followers: stream,
            social_media_followers: social,
        };
        self
    }

    pub fn with_memory_cap(mut self, cap: usize) -> Self {
        self.memories.set_cap(cap);
        self
    }

    pub fn money(&self) -> Decimal {
        self.money
    }

    pub fn needs(&self) -> &Needs {
        &self.needs
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn social(&self) -> &SocialCounters {
        &self.social
    }

    /// Derived from money; never stored.
    pub fn tier(&self) -> EconomicTier {
        EconomicTier::from_money(self.money)
    }

    /// Appends "action: result" to memories.
    pub fn remember(&mut self, clock: &WorldClock, action: &str, result: &str) {
        self.memories.push(clock, format!("{}: {}", action, result));
    }

    pub(crate) fn set_money(&mut self, money: Decimal) {
        self.money = money;
    }

    pub(crate) fn needs_mut(&mut self) -> &mut Needs {
        &mut self.needs
    }

    pub(crate) fn social_mut(&mut self) -> &mut SocialCounters {
        &mut self.social
    }

    /// Only the world registry calls this, after validating the target.
    pub(crate) fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }
}
