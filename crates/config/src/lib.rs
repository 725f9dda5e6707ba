//! Configuration for the phone agent
//!
//! Settings are layered with the `config` crate: compiled defaults, an
//! optional TOML file, then `PHONE_AGENT__*` environment variables.

pub mod constants;
pub mod settings;

pub use settings::{
    default_environment, AgentSettings, EffectSettings, FillerFailure, LoggingSettings,
    SearchSettings, Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
