//! Agent errors

use std::fmt;

use phone_agent_core::{ReasoningError, SynthesisError, TranscriptionError};
use thiserror::Error;

/// Which spoken sub-sequence of a turn was being synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechPhase {
    /// Filler phrase played on a tool invocation
    Filler,
    /// Final answer or fallback phrase
    Answer,
}

impl fmt::Display for SpeechPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechPhase::Filler => write!(f, "filler"),
            SpeechPhase::Answer => write!(f, "answer"),
        }
    }
}

/// Typed failure of one conversational turn.
///
/// Audio emitted before the failure has already been delivered; the error
/// only tells the caller where the turn stopped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurnError {
    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Reasoning failed: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("Synthesis of {phase} failed: {source}")]
    Synthesis {
        phase: SpeechPhase,
        source: SynthesisError,
    },
}

impl TurnError {
    /// Pipeline stage that produced the error
    pub fn stage(&self) -> &'static str {
        match self {
            TurnError::Transcription(_) => "transcription",
            TurnError::Reasoning(_) => "reasoning",
            TurnError::Synthesis { .. } => "synthesis",
        }
    }
}

/// Agent setup errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    #[error("Invalid turn configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let err: TurnError = TranscriptionError::backend("mic").into();
        assert_eq!(err.stage(), "transcription");

        let err: TurnError = ReasoningError::backend("llm").into();
        assert_eq!(err.stage(), "reasoning");

        let err = TurnError::Synthesis {
            phase: SpeechPhase::Filler,
            source: SynthesisError::backend("tts"),
        };
        assert_eq!(err.stage(), "synthesis");
        assert!(err.to_string().contains("filler"));
    }
}
