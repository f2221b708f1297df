//! Sample data fixtures for testing.
//!
//! Ready-made decisions and telemetry for other crates' tests.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // sim-events = { path = "../sim-events", features = ["test-fixtures"] }
//!
//! use sim_events::fixtures;
//!
//! let decisions = fixtures::sample_decisions();
//! ```

use crate::{Decision, DecisionSource, TelemetryEvent, Urgency, WorldClock};

/// Returns one decision per resolver category plus an unknown action.
pub fn sample_decisions() -> Vec<Decision> {
    vec![
        Decision::new("buy_cheap_food", "Starving", "desperate", Urgency::High),
        Decision::new("freelance_gig_search", "Need money", "determined", Urgency::High),
        Decision::new("find_place_to_rest", "Exhausted", "drained", Urgency::High),
        Decision::new("check_investments", "Market open", "calm", Urgency::Low),
        Decision::new("network_socially", "Gala tonight", "bored", Urgency::Low),
        Decision::new("write_blog_post", "Library wifi", "creative", Urgency::Medium),
        Decision::new("stream_for_donations", "Rent due", "anxious", Urgency::High)
            .with_tool("ask_viewers_for_help"),
        Decision::new("organize_rent_strike", "Enough", "angry", Urgency::Medium),
        Decision::new("stare_at_ceiling", "Nothing to do", "numb", Urgency::None)
            .with_source(DecisionSource::Inference),
    ]
}

/// Returns a short telemetry stream for one agent.
pub fn sample_telemetry() -> Vec<TelemetryEvent> {
    let mut clock = WorldClock::start(6);
    let mut events = Vec::new();
    for (action, result) in [
        ("visit_food_bank", "Waited in line, got food"),
        ("freelance_gig_search", "Earned $6.47 from gig work"),
        ("find_place_to_rest", "Rested on a library bench"),
    ] {
        events.push(
            TelemetryEvent::new("alex_chen", clock)
                .with_goal("survive")
                .with_action(action)
                .with_rationale("fixture")
                .with_result(result),
        );
        clock.advance(30);
    }
    events
}
