//! Inference-Backed Decisions
//!
//! Sends the prompt to an OpenAI-compatible chat-completion endpoint and
//! parses the reply. Any failure, including a closed gate, is answered by
//! the fallback provider inside the same call.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use sim_events::Decision;

use crate::actions::tools::ToolMenu;
use crate::components::agent::Agent;
use crate::config::{ConfigError, InferenceConfig};
use crate::systems::perception::Perception;

use super::fallback::FallbackProvider;
use super::gate::{CostTracker, PauseGate};
use super::prompt::{build_prompt, parse_decision};
use super::{DecisionError, DecisionProvider};

/// Hard cap on retries per decision.
pub const MAX_RETRIES: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub output: String,
    pub model: Option<String>,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// A blocking request/response completion service.
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, DecisionError>;
}

/// Chat-completions over HTTP with a request timeout.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpCompletionClient {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, DecisionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DecisionError::BuildClient(err.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Reads the API key from the configured environment variable.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, ConfigError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ConfigError::MissingEnv(config.api_key_env.clone()))?;
        Self::new(
            &config.base_url,
            api_key,
            Duration::from_millis(config.timeout_ms.max(1)),
        )
        .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl CompletionClient for HttpCompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, DecisionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatCompletionRequest {
            model: request.model.as_str(),
            max_tokens: request.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system_prompt.as_str(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user_prompt.as_str(),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| DecisionError::Transport(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().unwrap_or_else(|_| "<no body>".to_string());
            return Err(DecisionError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let response: ChatCompletionResponse = response
            .json()
            .map_err(|err| DecisionError::Decode(err.to_string()))?;

        let usage = response.usage;
        let first = response
            .choices
            .into_iter()
            .next()
            .ok_or(DecisionError::EmptyReply)?;
        if first.message.content.trim().is_empty() {
            return Err(DecisionError::EmptyReply);
        }

        Ok(CompletionResult {
            output: first.message.content,
            model: response.model,
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }
}

/// Inference provider with an embedded fallback.
pub struct InferenceProvider<C: CompletionClient> {
    client: C,
    model: String,
    max_tokens: u32,
    max_retries: u8,
    prompt_memory_count: usize,
    gate: PauseGate,
    cost: CostTracker,
    fallback: FallbackProvider,
    failures: u64,
}

impl<C: CompletionClient> InferenceProvider<C> {
    pub fn new(client: C, model: impl Into<String>, fallback: FallbackProvider) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: 500,
            max_retries: MAX_RETRIES,
            prompt_memory_count: 5,
            gate: PauseGate::new(),
            cost: CostTracker::default(),
            fallback,
            failures: 0,
        }
    }

    /// Retries above one are clamped.
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.min(MAX_RETRIES);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_prompt_memory_count(mut self, count: usize) -> Self {
        self.prompt_memory_count = count;
        self
    }

    pub fn with_gate(mut self, gate: PauseGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_cost_tracker(mut self, cost: CostTracker) -> Self {
        self.cost = cost;
        self
    }

    pub fn cost(&self) -> &CostTracker {
        &self.cost
    }

    /// Decisions that ended up coming from the fallback
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn try_decide(
        &mut self,
        agent: &Agent,
        perception: &Perception,
        recent_memories: &[String],
    ) -> Result<Decision, DecisionError> {
        self.gate.check(&self.cost)?;

        let start = recent_memories.len().saturating_sub(self.prompt_memory_count);
        let prompt = build_prompt(
            agent,
            perception,
            &ToolMenu::for_tier(perception.tier),
            &recent_memories[start..],
        );
        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: prompt.system,
            user_prompt: prompt.user,
            max_tokens: self.max_tokens,
        };

        let attempts = 1 + u32::from(self.max_retries);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.complete(&request) {
                Ok(result) => {
                    self.cost.record(
                        result.prompt_tokens.unwrap_or(0),
                        result.completion_tokens.unwrap_or(0),
                    );
                    return parse_decision(&result.output);
                }
                Err(err) if err.is_transient() && attempt < attempts => {
                    tracing::debug!("Inference attempt {} for {} failed: {}", attempt, agent.id, err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<C: CompletionClient> DecisionProvider for InferenceProvider<C> {
    fn decide(&mut self, agent: &Agent, perception: &Perception, recent_memories: &[String]) -> Decision {
        match self.try_decide(agent, perception, recent_memories) {
            Ok(decision) => decision,
            Err(err) => {
                self.failures += 1;
                tracing::warn!("Inference unavailable for {}: {}; using fallback", agent.id, err);
                self.fallback.decide(agent, perception, recent_memories)
            }
        }
    }

    fn name(&self) -> &'static str {
        "inference"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::Needs;
    use crate::setup::create_world_map;
    use crate::state::SimulationState;
    use crate::systems::perception::perceive;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;
    use sim_events::DecisionSource;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct MockClient {
        outputs: Vec<Result<String, DecisionError>>,
        calls: Cell<usize>,
    }

    impl MockClient {
        fn replying(outputs: Vec<Result<String, DecisionError>>) -> Self {
            Self {
                outputs,
                calls: Cell::new(0),
            }
        }
    }

    impl CompletionClient for MockClient {
        fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, DecisionError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            let output = self
                .outputs
                .get(n)
                .or_else(|| self.outputs.last())
                .cloned()
                .unwrap_or(Err(DecisionError::EmptyReply))?;
            Ok(CompletionResult {
                output,
                model: Some(request.model.clone()),
                prompt_tokens: Some(12),
                completion_tokens: Some(4),
            })
        }
    }

    fn setup() -> (Agent, Perception) {
        let alex = Agent::new("alex_chen", Decimal::from(47), "public_library")
            .with_needs(Needs::new(85, 70, 80));
        let mut state = SimulationState::new(create_world_map(), 6);
        state.insert_agent(alex.clone());
        let perception = perceive(&alex, &state, &mut SmallRng::seed_from_u64(1)).unwrap();
        (alex, perception)
    }

    #[test]
    fn test_uses_model_reply() {
        let (alex, perception) = setup();
        let client = MockClient::replying(vec![Ok(
            r#"{"action": "write_blog_post", "urgency": "low", "emotion": "determined"}"#.to_string(),
        )]);
        let mut provider = InferenceProvider::new(client, "test-model", FallbackProvider::new(1));

        let decision = provider.decide(&alex, &perception, &[]);
        assert_eq!(decision.action, "write_blog_post");
        assert_eq!(decision.source, DecisionSource::Inference);
        assert_eq!(provider.cost().prompt_tokens, 12);
        assert_eq!(provider.failures(), 0);
    }

    #[test]
    fn test_transport_failure_falls_back() {
        let (alex, perception) = setup();
        let client = MockClient::replying(vec![Err(DecisionError::Transport("timed out".into()))]);
        let mut provider = InferenceProvider::new(client, "test-model", FallbackProvider::new(1));

        let decision = provider.decide(&alex, &perception, &[]);
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(decision.action, "buy_cheap_food");
        assert_eq!(provider.failures(), 1);
        assert_eq!(provider.client.calls.get(), 2);
    }

    #[test]
    fn test_retry_once_then_succeed() {
        let (alex, perception) = setup();
        let client = MockClient::replying(vec![
            Err(DecisionError::Status {
                code: 503,
                message: "busy".into(),
            }),
            Ok(r#"{"action": "rest"}"#.to_string()),
        ]);
        let mut provider = InferenceProvider::new(client, "m", FallbackProvider::new(1)).with_max_retries(9);

        let decision = provider.decide(&alex, &perception, &[]);
        assert_eq!(decision.action, "rest");
        assert_eq!(provider.client.calls.get(), 2);
    }

    #[test]
    fn test_zero_retries() {
        let (alex, perception) = setup();
        let client = MockClient::replying(vec![Err(DecisionError::Transport("down".into()))]);
        let mut provider = InferenceProvider::new(client, "m", FallbackProvider::new(1)).with_max_retries(0);

        provider.decide(&alex, &perception, &[]);
        assert_eq!(provider.client.calls.get(), 1);
    }

    #[test]
    fn test_garbage_reply_falls_back_without_retry() {
        let (alex, perception) = setup();
        let client = MockClient::replying(vec![Ok("I think I'll go for a walk.".to_string())]);
        let mut provider = InferenceProvider::new(client, "m", FallbackProvider::new(1));

        let decision = provider.decide(&alex, &perception, &[]);
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(provider.client.calls.get(), 1);
    }

    #[test]
    fn test_paused_gate_skips_the_call() {
        let (alex, perception) = setup();
        let dir = tempfile::tempdir().unwrap();
        let pause = dir.path().join("PAUSE");
        std::fs::write(&pause, "").unwrap();

        let client = MockClient::replying(vec![Ok(r#"{"action": "rest"}"#.to_string())]);
        let mut provider = InferenceProvider::new(client, "m", FallbackProvider::new(1))
            .with_gate(PauseGate::new().with_pause_file(&pause));

        let decision = provider.decide(&alex, &perception, &[]);
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(provider.client.calls.get(), 0);
    }

    #[test]
    fn test_unreachable_endpoint_falls_back() {
        let (alex, perception) = setup();
        let client = HttpCompletionClient::new("http://127.0.0.1:9", "key", Duration::from_millis(200)).unwrap();
        let mut provider = InferenceProvider::new(client, "m", FallbackProvider::new(1)).with_max_retries(0);

        let decision = provider.decide(&alex, &perception, &[]);
        assert_eq!(decision.source, DecisionSource::Fallback);
    }
}
