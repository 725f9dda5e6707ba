//! Speech-to-Text backends
//!
//! Real recognition engines live behind the [`Transcriber`] port. This module
//! carries the offline backend used for demos and tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use phone_agent_core::{AudioChunk, Transcriber, TranscriptionError};

/// What the scripted backend answers with
#[derive(Debug, Clone)]
enum Script {
    Transcript(String),
    Failure(String),
}

/// Transcriber that returns a fixed transcript regardless of the audio
pub struct ScriptedTranscriber {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub fn new(transcript: impl Into<String>) -> Self {
        tracing::warn!("Using scripted STT backend - no recognition will occur");
        Self {
            script: Script::Transcript(transcript.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Backend that fails every call with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Failure(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of transcription requests served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, audio: &AudioChunk) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if audio.sample_rate() == 0 {
            return Err(TranscriptionError::InvalidInput(
                "sample rate must be positive".to_string(),
            ));
        }
        match &self.script {
            Script::Transcript(text) => Ok(text.clone()),
            Script::Failure(message) => Err(TranscriptionError::backend(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
