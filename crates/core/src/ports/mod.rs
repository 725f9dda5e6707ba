//! Port traits for the external collaborators of a turn
//!
//! The pipeline never recognizes speech, reasons or synthesizes on its own;
//! it drives these ports:
//! - [`Transcriber`]: audio chunk to text
//! - [`ReasoningEngine`]: conversation turn to a lazy stream of step events
//! - [`SpeechSynthesizer`]: text to a lazy stream of audio chunks
//! - [`PropertySearch`]: natural-language query to a bounded list of records

mod reasoning;
mod search;
mod synthesizer;
mod transcriber;

pub use reasoning::{ReasoningEngine, StepStream};
pub use search::{Property, PropertySearch};
pub use synthesizer::{AudioStream, SpeechSynthesizer};
pub use transcriber::Transcriber;
