use async_trait::async_trait;

use crate::{AudioChunk, TranscriptionError};

/// Speech-to-text collaborator
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one voice-activity-segmented utterance
    async fn transcribe(&self, audio: &AudioChunk) -> Result<String, TranscriptionError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
