//! Audio pipeline for the phone agent
//!
//! - Bounded effect player for the filler sound played during lookups
//! - Effect asset loading (WAV via hound, resampling via rubato)
//! - Offline STT/TTS backends for demos and tests

pub mod effect;
pub mod stt;
pub mod tts;

pub use effect::{load_effect_chunks, BoundedEffectPlayer, EffectBudget, EffectStream};
pub use stt::ScriptedTranscriber;
pub use tts::SilenceSynthesizer;

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("IO error: {0}")]
    Io(String),
}
