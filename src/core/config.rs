//! Duel configuration with documented constants
//!
//! All tunable numbers live here. The backend section describes how to reach
//! the live text-generation endpoint; the engine section holds the game
//! rules the engine enforces regardless of what the backend says.
//!
//! Configuration is loaded from TOML (every field optional) and then
//! overridden from the environment for credentials.

use crate::core::error::{DuelError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for the live text-generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// API credential. `None` means the session runs offline.
    pub api_key: Option<String>,

    /// Completion endpoint URL
    ///
    /// URLs on anthropic.com use the Anthropic messages format; everything
    /// else is treated as OpenAI-compatible.
    pub api_url: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Token budget for init and round prompts
    pub max_tokens: u32,

    /// Token budget for the connectivity probe made at construction
    pub probe_max_tokens: u32,

    /// Attempts per call before falling back to offline output
    pub max_attempts: u32,

    /// Base backoff in milliseconds
    ///
    /// After failed attempt `n` (0-based) the backend sleeps
    /// `backoff_base_ms * 2^n`. At the default of 1000 that is 1s then 2s.
    pub backoff_base_ms: u64,

    /// Skip the live backend entirely
    pub force_offline: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.deepseek.com/chat/completions".into(),
            model: "deepseek-chat".into(),
            timeout_secs: 30,
            max_tokens: 1500,
            probe_max_tokens: 10,
            max_attempts: 3,
            backoff_base_ms: 1000,
            force_offline: false,
        }
    }
}

/// Game rules enforced by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard round cap; the game is over once this many rounds are played
    pub max_rounds: u32,

    /// Absolute hp at or below which the battle enters its climax
    ///
    /// Not proportional to max_hp: a 2000 hp combatant reaches climax at
    /// 15% while an 800 hp one reaches it at 37.5%.
    pub climax_hp_threshold: u32,

    /// Upper bound of the hp scale backend values are clamped into
    pub hp_ceiling: u32,

    /// Player hp/max_hp when the backend omits them
    pub default_player_hp: u32,

    /// Enemy hp/max_hp when the backend omits them
    pub default_enemy_hp: u32,

    /// Summaries are refreshed after every N-th completed round
    pub summary_interval: u32,

    /// Number of trailing history entries fed to the summary prompt
    pub summary_window: usize,

    /// Replies at or below this many characters never replace the summary
    pub summary_min_chars: usize,

    /// Sampling temperature for the init prompt
    pub init_temperature: f32,

    /// Sampling temperature for round prompts
    pub round_temperature: f32,

    /// Sampling temperature for summary prompts
    pub summary_temperature: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            climax_hp_threshold: 300,
            hp_ceiling: 2000,
            default_player_hp: 1000,
            default_enemy_hp: 1200,
            summary_interval: 3,
            summary_window: 3,
            summary_min_chars: 10,
            init_temperature: 0.8,
            round_temperature: 0.7,
            summary_temperature: 0.3,
        }
    }
}

/// Complete configuration for a duel session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuelConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DuelConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that never touches the network
    pub fn offline() -> Self {
        let mut config = Self::default();
        config.backend.force_offline = true;
        config
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: DuelConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Override backend settings from the environment
    ///
    /// Reads LLM_API_KEY, LLM_API_URL and LLM_MODEL. Unset variables leave
    /// the current values alone.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("LLM_API_URL") {
            self.backend.api_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.backend.model = model;
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        let backend = &self.backend;

        if backend.max_attempts == 0 {
            return Err(DuelError::Config("max_attempts must be at least 1".into()));
        }

        if engine.max_rounds == 0 {
            return Err(DuelError::Config("max_rounds must be at least 1".into()));
        }

        if engine.summary_interval == 0 {
            return Err(DuelError::Config(
                "summary_interval must be at least 1".into(),
            ));
        }

        if engine.hp_ceiling == 0 {
            return Err(DuelError::Config("hp_ceiling must be positive".into()));
        }

        if engine.climax_hp_threshold >= engine.hp_ceiling {
            return Err(DuelError::Config(format!(
                "climax_hp_threshold ({}) should be < hp_ceiling ({})",
                engine.climax_hp_threshold, engine.hp_ceiling
            )));
        }

        for (name, hp) in [
            ("default_player_hp", engine.default_player_hp),
            ("default_enemy_hp", engine.default_enemy_hp),
        ] {
            if hp == 0 || hp > engine.hp_ceiling {
                return Err(DuelError::Config(format!(
                    "{} ({}) must be within 1..={}",
                    name, hp, engine.hp_ceiling
                )));
            }
        }

        for (name, t) in [
            ("init_temperature", engine.init_temperature),
            ("round_temperature", engine.round_temperature),
            ("summary_temperature", engine.summary_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(DuelError::Config(format!(
                    "{} ({}) must be within 0.0..=2.0",
                    name, t
                )));
            }
        }

        Ok(())
    }
}
