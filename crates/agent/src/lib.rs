//! Phone conversation agent
//!
//! Features:
//! - Turn orchestration: transcription, streaming tool-calling reasoning and
//!   synthesis composed into one ordered, abandonable audio stream
//! - Filler phrase and bounded sound effect on each tool round
//! - Call sessions with per-call thread ids
//! - Offline keyword reasoner backed by the property search tool

pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod reasoner;
pub mod session;

pub use error::{AgentError, SpeechPhase, TurnError};
pub use orchestrator::{
    TurnConfig, TurnOrchestrator, TurnOrchestratorBuilder, TurnOutcome, TurnStream,
};
pub use reasoner::KeywordToolReasoner;
pub use session::{CallSession, SessionDeps};
