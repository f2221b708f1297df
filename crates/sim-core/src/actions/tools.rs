//! Tools
//!
//! Abstract capabilities an agent may reference in a decision. The menu is
//! gated by economic tier. Execution goes through [`ToolExecutor`]; the stock
//! executor only returns descriptive text and ledger effects, it never opens
//! a process or a socket.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use sim_events::EconomicTier;

use crate::components::agent::{Agent, NeedKind};
use crate::systems::ledger::LedgerField;

/// Tool names
pub mod names {
    pub const BRAVE_SEARCH: &str = "brave_search";
    pub const GOOGLE_MAPS: &str = "google_maps";
    pub const FILESYSTEM: &str = "filesystem";
    pub const GITHUB: &str = "github";
    pub const PUPPETEER: &str = "puppeteer";
    pub const EMAIL: &str = "email";
    pub const SLACK: &str = "slack";
    pub const POSTGRES: &str = "postgres";
    pub const AWS_KB: &str = "aws_kb";
    pub const FINANCE: &str = "finance";

    pub const ASK_VIEWERS_FOR_HELP: &str = "ask_viewers_for_help";
    pub const READ_VIEWER_MESSAGES: &str = "read_viewer_messages";
    pub const RESPOND_TO_VIEWER: &str = "respond_to_viewer";
    pub const CHECK_VIEWER_SENTIMENT: &str = "check_viewer_sentiment";
    pub const READ_DONATIONS: &str = "read_donations";
    pub const THANK_DONOR: &str = "thank_donor";
    pub const POST_TO_SOCIAL: &str = "post_to_social";
    pub const CHECK_CROWDFUNDING: &str = "check_crowdfunding";
    pub const STREAM_PERFORMANCE: &str = "stream_performance";
}

/// Tool effect constants
pub mod tool_effects {
    /// Donation when viewers respond to a plea
    pub const VIEWER_HELP: i64 = 10;
    /// Plea only lands below this much money
    pub const VIEWER_HELP_MONEY_BELOW: i64 = 50;
    /// Plea only lands above this hunger
    pub const VIEWER_HELP_HUNGER_ABOVE: u8 = 70;
    pub const CROWDFUND_PAYOUT: i64 = 50;
    pub const CROWDFUND_FOLLOWERS_ABOVE: u64 = 1000;
    pub const SOCIAL_POST_FOLLOWERS: i64 = 5;
    pub const BLOG_POST_FOLLOWERS: i64 = 10;
    pub const PERFORMANCE_FOLLOWERS: i64 = 10;
}

/// A single tool on a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

/// Capabilities visible to one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMenu {
    pub tier: EconomicTier,
    pub tools: Vec<ToolSpec>,
}

impl ToolMenu {
    /// Builds the menu for a tier. Higher tiers see a superset.
    pub fn for_tier(tier: EconomicTier) -> Self {
        use names::*;

        let mut entries: Vec<(&str, &str)> = vec![
            (BRAVE_SEARCH, "Search the web"),
            (GOOGLE_MAPS, "Find nearby places"),
            (FILESYSTEM, "Read and write local files"),
            (ASK_VIEWERS_FOR_HELP, "Ask stream viewers for help"),
            (READ_VIEWER_MESSAGES, "Read viewer messages"),
            (RESPOND_TO_VIEWER, "Reply to a viewer"),
            (CHECK_VIEWER_SENTIMENT, "Gauge how viewers feel"),
            (READ_DONATIONS, "List recent donations"),
            (THANK_DONOR, "Thank a donor"),
            (POST_TO_SOCIAL, "Post to social media or a blog"),
            (CHECK_CROWDFUNDING, "Check the crowdfunding page"),
            (STREAM_PERFORMANCE, "Perform live for viewers"),
        ];
        if tier >= EconomicTier::Middle {
            entries.extend([
                (GITHUB, "Manage code repositories"),
                (PUPPETEER, "Automate a browser"),
                (EMAIL, "Send email"),
            ]);
        }
        if tier.is_affluent() {
            entries.extend([
                (SLACK, "Message a team"),
                (POSTGRES, "Query business data"),
                (AWS_KB, "Search a private knowledge base"),
                (FINANCE, "Trade and analyze markets"),
            ]);
        }

        Self {
            tier,
            tools: entries
                .into_iter()
                .map(|(name, description)| ToolSpec {
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }

    pub fn allows(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t.name == tool)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// What a tool did.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool: String,
    pub text: String,
    /// Ledger changes the resolver applies
    pub effects: Vec<(LedgerField, Decimal)>,
}

impl ToolResult {
    pub fn text(tool: &str, text: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            text: text.into(),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, field: LedgerField, delta: Decimal) -> Self {
        self.effects.push((field, delta));
        self
    }
}

/// Executes a tool on behalf of an agent.
pub trait ToolExecutor {
    fn execute(
        &mut self,
        tool: &str,
        args: &BTreeMap<String, serde_json::Value>,
        agent: &Agent,
    ) -> ToolResult;
}

/// Deterministic stand-in for external tool servers.
#[derive(Debug, Clone, Default)]
pub struct StubToolExecutor {
    calls: u64,
}

impl StubToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl ToolExecutor for StubToolExecutor {
    fn execute(
        &mut self,
        tool: &str,
        args: &BTreeMap<String, serde_json::Value>,
        agent: &Agent,
    ) -> ToolResult {
        use names::*;
        use tool_effects::*;

        self.calls += 1;
        match tool {
            ASK_VIEWERS_FOR_HELP => {
                let needy = agent.money() < Decimal::from(VIEWER_HELP_MONEY_BELOW)
                    && agent.needs().hunger() > VIEWER_HELP_HUNGER_ABOVE;
                if needy {
                    ToolResult::text(tool, format!("Viewers sent ${}", VIEWER_HELP))
                        .with_effect(LedgerField::Money, Decimal::from(VIEWER_HELP))
                } else {
                    ToolResult::text(tool, "Viewers sent sympathy but no money")
                }
            }
            POST_TO_SOCIAL => {
                let platform = args
                    .get("platform")
                    .and_then(|v| v.as_str())
                    .unwrap_or("social");
                let gain = if platform == "blog" {
                    BLOG_POST_FOLLOWERS
                } else {
                    SOCIAL_POST_FOLLOWERS
                };
                ToolResult::text(tool, format!("Posted to {}, gained {} followers", platform, gain))
                    .with_effect(LedgerField::SocialMediaFollowers, Decimal::from(gain))
            }
            CHECK_CROWDFUNDING => {
                if agent.social().stream_followers > CROWDFUND_FOLLOWERS_ABOVE {
                    ToolResult::text(tool, format!("Crowdfunding raised ${}", CROWDFUND_PAYOUT))
                        .with_effect(LedgerField::Money, Decimal::from(CROWDFUND_PAYOUT))
                } else {
                    ToolResult::text(tool, "No new pledges")
                        .with_effect(LedgerField::Need(NeedKind::Stress), Decimal::from(3))
                }
            }
            STREAM_PERFORMANCE => ToolResult::text(tool, "Performed live, gained 10 followers")
                .with_effect(LedgerField::StreamFollowers, Decimal::from(PERFORMANCE_FOLLOWERS)),
            READ_VIEWER_MESSAGES => ToolResult::text(tool, "Read a handful of supportive messages")
                .with_effect(LedgerField::Need(NeedKind::Stress), Decimal::from(-2)),
            RESPOND_TO_VIEWER => ToolResult::text(tool, "Replied to a viewer"),
            CHECK_VIEWER_SENTIMENT => ToolResult::text(tool, "Viewers are mostly sympathetic"),
            READ_DONATIONS => ToolResult::text(tool, "No new donations since last check"),
            THANK_DONOR => ToolResult::text(tool, "Thanked the most recent donor"),
            other => {
                let query = args
                    .get("query")
                    .and_then(|v| v.as_str())
                    .unwrap_or("the usual");
                ToolResult::text(other, format!("{} returned results for {}", other, query))
            }
        }
    }
}
