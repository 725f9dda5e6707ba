//! Port error types
//!
//! Each external collaborator fails with its own error type so a turn
//! failure can always be traced back to the stage that produced it.

use std::time::Duration;

use thiserror::Error;

/// Transcription port failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptionError {
    #[error("Transcription backend error: {0}")]
    Backend(String),

    #[error("Invalid audio input: {0}")]
    InvalidInput(String),

    #[error("Transcription timed out after {0:?}")]
    Timeout(Duration),
}

/// Reasoning port failure, raised at any point while iterating steps
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReasoningError {
    #[error("Reasoning backend error: {0}")]
    Backend(String),

    #[error("Tool execution failed: {0}")]
    Tool(String),

    #[error("Reasoning step timed out after {0:?}")]
    Timeout(Duration),
}

/// Synthesis port failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("Synthesis backend error: {0}")]
    Backend(String),

    #[error("Synthesis timed out after {0:?}")]
    Timeout(Duration),
}

/// Property lookup failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Search backend error: {0}")]
    Backend(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
}

impl TranscriptionError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl ReasoningError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl SynthesisError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
