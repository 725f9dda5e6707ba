//! Layered application settings
//!
//! Precedence, lowest first: compiled defaults, an optional TOML file, then
//! `PHONE_AGENT__*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::ConfigError;

/// What a turn does when the filler phrase cannot be synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillerFailure {
    /// Surface the synthesis error and end the turn
    #[default]
    Abort,
    /// Log a warning, drop the rest of the filler phrase and keep going
    Skip,
}

/// Turn orchestration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Filler phrase spoken when a tool is invoked
    pub tool_use_message: String,
    /// Phrase spoken when reasoning yields nothing
    pub fallback_message: String,
    /// Effect cutoff per tool round; `0` disables the effect
    pub sound_effect_seconds: f64,
    /// Deadline for each individual port await
    pub port_timeout_ms: Option<u64>,
    pub filler_failure: FillerFailure,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            tool_use_message: constants::phrases::TOOL_USE_MESSAGE.to_string(),
            fallback_message: constants::phrases::FALLBACK_MESSAGE.to_string(),
            sound_effect_seconds: constants::effect::MAX_DURATION_SECS,
            port_timeout_ms: None,
            filler_failure: FillerFailure::default(),
        }
    }
}

/// Filler sound effect asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// WAV asset; no effect is played when unset
    pub path: Option<PathBuf>,
    pub chunk_ms: u32,
    pub target_rate: u32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            path: None,
            chunk_ms: constants::effect::CHUNK_MS,
            target_rate: constants::effect::TARGET_RATE,
        }
    }
}

/// Property search tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// JSON array of property records
    pub data_path: Option<PathBuf>,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            data_path: None,
            default_limit: constants::search::DEFAULT_LIMIT,
            max_limit: constants::search::MAX_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Root settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub agent: AgentSettings,
    pub effect: EffectSettings,
    pub search: SearchSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load from `config/default.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = File::with_name(constants::env::DEFAULT_CONFIG_FILE).required(false);
        Self::from_config(
            Config::builder()
                .add_source(file)
                .add_source(default_environment())
                .build()?,
        )
    }

    /// Load from an explicit config file plus the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(Some(path.as_ref()), default_environment())
    }

    /// Load from an explicit file and environment source
    pub fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        Self::from_config(builder.add_source(env).build()?)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secs = self.agent.sound_effect_seconds;
        if !secs.is_finite() || secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "agent.sound_effect_seconds must be a non-negative number, got {}",
                secs
            )));
        }
        if self.agent.port_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "agent.port_timeout_ms must be positive when set".to_string(),
            ));
        }
        if self.effect.chunk_ms == 0 {
            return Err(ConfigError::Invalid("effect.chunk_ms must be positive".to_string()));
        }
        if self.effect.target_rate == 0 {
            return Err(ConfigError::Invalid(
                "effect.target_rate must be positive".to_string(),
            ));
        }
        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(ConfigError::Invalid(format!(
                "search.default_limit must be in 1..={}, got {}",
                self.search.max_limit, self.search.default_limit
            )));
        }
        Ok(())
    }
}

/// `PHONE_AGENT__SECTION__KEY` environment source
pub fn default_environment() -> Environment {
    Environment::with_prefix(constants::env::PREFIX)
        .prefix_separator(constants::env::SEPARATOR)
        .separator(constants::env::SEPARATOR)
        .try_parsing(true)
}
