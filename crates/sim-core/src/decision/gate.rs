//! Inference Gate
//!
//! Consulted before every inference call. A pause file on disk or a spent
//! budget closes the gate, and the caller falls back to the rule table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::DecisionError;

/// Running token usage and its dollar cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTracker {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub calls: u64,
    input_price_per_1k: Decimal,
    output_price_per_1k: Decimal,
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new(Decimal::new(3, 3), Decimal::new(15, 3))
    }
}

impl CostTracker {
    pub fn new(input_price_per_1k: Decimal, output_price_per_1k: Decimal) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            calls: 0,
            input_price_per_1k,
            output_price_per_1k,
        }
    }

    pub fn record(&mut self, prompt_tokens: u64, completion_tokens: u64) {
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        self.calls += 1;
    }

    /// Total spend in dollars
    pub fn cost(&self) -> Decimal {
        let thousand = Decimal::from(1000);
        Decimal::from(self.prompt_tokens) * self.input_price_per_1k / thousand
            + Decimal::from(self.completion_tokens) * self.output_price_per_1k / thousand
    }
}

/// Decides whether inference may be attempted right now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PauseGate {
    pub pause_file: Option<PathBuf>,
    pub cost_ceiling: Option<Decimal>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pause_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pause_file = Some(path.into());
        self
    }

    pub fn with_cost_ceiling(mut self, ceiling: Decimal) -> Self {
        self.cost_ceiling = Some(ceiling);
        self
    }

    /// Ok when open; `DecisionError::Paused` with the reason otherwise.
    pub fn check(&self, tracker: &CostTracker) -> Result<(), DecisionError> {
        if let Some(path) = &self.pause_file {
            if path.exists() {
                return Err(DecisionError::Paused(format!(
                    "pause file {} present",
                    path.display()
                )));
            }
        }
        if let Some(ceiling) = self.cost_ceiling {
            let spent = tracker.cost();
            if spent >= ceiling {
                return Err(DecisionError::Paused(format!(
                    "cost ${} reached ceiling ${}",
                    spent, ceiling
                )));
            }
        }
        Ok(())
    }
}
