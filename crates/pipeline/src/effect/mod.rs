//! Filler sound effects
//!
//! A pre-loaded sound (keyboard typing, hold tone) streamed while a slow
//! lookup runs, cut off after a configurable duration.

mod loader;
mod player;

pub use loader::{load_effect_chunks, resample};
pub use player::{BoundedEffectPlayer, EffectBudget, EffectStream};
