//! Core types and port traits for the phone agent
//!
//! This crate defines the data that moves through a conversational turn and
//! the interfaces of the collaborators the turn pipeline orchestrates.

pub mod audio;
pub mod conversation;
pub mod error;
pub mod ports;

pub use audio::{samples_per_chunk, AudioChunk};
pub use conversation::{ConversationTurn, StepEvent, MODEL_STEP, TOOLS_STEP};
pub use error::{ReasoningError, SearchError, SynthesisError, TranscriptionError};
pub use ports::{
    AudioStream, Property, PropertySearch, ReasoningEngine, SpeechSynthesizer, StepStream,
    Transcriber,
};
