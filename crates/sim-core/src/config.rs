//! Configuration loading for the simulation.
//!
//! All settings come from a TOML file; every section is optional and falls
//! back to its defaults. CLI flags are applied on top by the binary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::decision::gate::{CostTracker, PauseGate};
use crate::decision::inference::MAX_RETRIES;

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Core loop settings
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// External inference settings
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Backing store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Telemetry sink settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.memory_cap == 0 {
            return Err(ConfigError::Invalid("memory_cap must be at least 1".to_string()));
        }
        if sim.start_hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "start_hour {} is not an hour of the day",
                sim.start_hour
            )));
        }
        if sim.min_step_minutes == 0 || sim.min_step_minutes > sim.max_step_minutes {
            return Err(ConfigError::Invalid(format!(
                "clock step range {}..={} is empty",
                sim.min_step_minutes, sim.max_step_minutes
            )));
        }
        Ok(())
    }
}

/// Core loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for every rng in the run
    pub seed: u64,
    /// Memories kept per agent
    pub memory_cap: usize,
    /// Memories included in a decision prompt
    pub prompt_memory_count: usize,
    /// In-world hour on turn 0
    pub start_hour: u32,
    pub min_step_minutes: u32,
    pub max_step_minutes: u32,
    /// Allow money below zero
    pub debt_enabled: bool,
    pub max_encounter_pairs_per_location: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            memory_cap: 30,
            prompt_memory_count: 5,
            start_hour: 6,
            min_step_minutes: 30,
            max_step_minutes: 30,
            debt_enabled: false,
            max_encounter_pairs_per_location: 2,
        }
    }
}

/// External inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_ms: u64,
    /// Clamped to 0..=1
    pub max_retries: u8,
    pub max_tokens: u32,
    /// Inference pauses while this file exists
    pub pause_file: Option<PathBuf>,
    /// Inference pauses once this many dollars are spent
    pub cost_ceiling: Option<Decimal>,
    pub input_price_per_1k: Decimal,
    pub output_price_per_1k: Decimal,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "INFERENCE_API_KEY".to_string(),
            timeout_ms: 30_000,
            max_retries: 1,
            max_tokens: 500,
            pause_file: None,
            cost_ceiling: None,
            input_price_per_1k: Decimal::new(3, 3),
            output_price_per_1k: Decimal::new(15, 3),
        }
    }
}

impl InferenceConfig {
    pub fn effective_retries(&self) -> u8 {
        self.max_retries.min(MAX_RETRIES)
    }

    pub fn gate(&self) -> PauseGate {
        PauseGate {
            pause_file: self.pause_file.clone(),
            cost_ceiling: self.cost_ceiling,
        }
    }

    pub fn cost_tracker(&self) -> CostTracker {
        CostTracker::new(self.input_price_per_1k, self.output_price_per_1k)
    }
}

/// Which store backs the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// One JSON file per record under a directory
    #[default]
    Json,
    /// Nothing survives the process
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Json,
            directory: PathBuf::from("state"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// JSONL output; no telemetry when unset
    pub path: Option<PathBuf>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
