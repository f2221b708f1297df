//! Decision Providers
//!
//! A provider turns an agent, its perception and a few recent memories into
//! one [`Decision`]. Two providers exist: a weighted rule table that always
//! answers, and an inference adapter that asks a chat-completion endpoint and
//! drops back to the rule table whenever anything goes wrong.

use thiserror::Error;

use sim_events::Decision;

use crate::components::agent::Agent;
use crate::systems::perception::Perception;

pub mod fallback;
pub mod gate;
pub mod inference;
pub mod prompt;

pub use fallback::{Candidate, FallbackProvider};
pub use gate::{CostTracker, PauseGate};
pub use inference::{
    CompletionClient, CompletionRequest, CompletionResult, HttpCompletionClient, InferenceProvider,
};
pub use prompt::{build_prompt, parse_decision, PromptParts};

/// Something that picks an action for an agent.
///
/// Implementations never fail: a provider that can fail internally must
/// substitute a decision of its own.
pub trait DecisionProvider {
    fn decide(&mut self, agent: &Agent, perception: &Perception, recent_memories: &[String]) -> Decision;

    /// Short label used in logs
    fn name(&self) -> &'static str;
}

/// Why an inference-backed decision could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("client build failed: {0}")]
    BuildClient(String),

    #[error("http request failed: {0}")]
    Transport(String),

    #[error("http status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("decode response failed: {0}")]
    Decode(String),

    #[error("empty completion choice")]
    EmptyReply,

    #[error("inference paused: {0}")]
    Paused(String),

    #[error("malformed decision payload: {0}")]
    Malformed(String),
}

impl DecisionError {
    /// Worth one more attempt within the retry budget.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DecisionError::Transport(_) | DecisionError::Status { .. } | DecisionError::EmptyReply
        )
    }
}
