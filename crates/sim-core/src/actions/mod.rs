//! Action Taxonomy
//!
//! Free-form action strings are mapped onto a fixed set of categories by
//! keyword match on their `_`-separated tokens. The first matching rule wins.

use serde::{Deserialize, Serialize};
use std::fmt;

use sim_events::Decision;

pub mod payouts;
pub mod resolve;
pub mod tools;

pub use payouts::{MoneyChange, NeedChange, Outcome, PayoutTable};
pub use resolve::{ActionResolver, Resolution};
pub use tools::{StubToolExecutor, ToolExecutor, ToolMenu, ToolResult};

/// Resolver category for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Food,
    Work,
    Rest,
    Invest,
    Social,
    Content,
    Stream,
    Organize,
    Tool,
    Unknown,
}

impl ActionCategory {
    pub fn all() -> &'static [ActionCategory] {
        &[
            ActionCategory::Food,
            ActionCategory::Work,
            ActionCategory::Rest,
            ActionCategory::Invest,
            ActionCategory::Social,
            ActionCategory::Content,
            ActionCategory::Stream,
            ActionCategory::Organize,
            ActionCategory::Tool,
            ActionCategory::Unknown,
        ]
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionCategory::Food => "food",
            ActionCategory::Work => "work",
            ActionCategory::Rest => "rest",
            ActionCategory::Invest => "invest",
            ActionCategory::Social => "social",
            ActionCategory::Content => "content",
            ActionCategory::Stream => "stream",
            ActionCategory::Organize => "organize",
            ActionCategory::Tool => "tool",
            ActionCategory::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// Ordered keyword rules. A token matches a keyword when it starts with it.
const RULES: &[(ActionCategory, &[&str])] = &[
    (ActionCategory::Work, &["shift"]),
    (ActionCategory::Food, &["food", "eat", "eating", "lunch", "meal", "coffee", "snack", "groceries"]),
    (ActionCategory::Rest, &["rest", "sleep", "nap", "breathe", "recover"]),
    (ActionCategory::Organize, &["strike", "organize", "organizing", "protest", "union"]),
    (ActionCategory::Stream, &["stream", "donation", "crowdfund", "viewers", "tips"]),
    (ActionCategory::Invest, &["invest", "portfolio", "finance", "stocks"]),
    (ActionCategory::Content, &["write", "blog", "post", "film", "vlog", "edit"]),
    (ActionCategory::Work, &["work", "gig", "submit", "freelance", "code", "project", "job", "deliver"]),
    (ActionCategory::Social, &["network", "social", "interact", "meeting", "gala"]),
];

/// Classifies a raw action string.
pub fn classify_action(action: &str) -> ActionCategory {
    let lowered = action.to_lowercase();
    if lowered.starts_with("work_on_") {
        return ActionCategory::Work;
    }
    // Agent ids after the prefix must not be read as keywords
    if lowered.starts_with("interact_with_") {
        return ActionCategory::Social;
    }
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    for (category, keywords) in RULES {
        if tokens
            .iter()
            .any(|token| keywords.iter().any(|kw| token.starts_with(kw)))
        {
            return *category;
        }
    }
    ActionCategory::Unknown
}

/// Classifies a decision. An explicit tool target always wins.
pub fn classify_decision(decision: &Decision) -> ActionCategory {
    if decision.target_tool.is_some() {
        ActionCategory::Tool
    } else {
        classify_action(&decision.action)
    }
}
