//! Text-to-Speech backends
//!
//! Real synthesis engines live behind the [`SpeechSynthesizer`] port. This
//! module carries the offline backend used for demos and tests.

use futures::stream;
use phone_agent_config::constants;
use phone_agent_core::{AudioChunk, AudioStream, SpeechSynthesizer};

/// Stub backend when no model is loaded (returns silence)
///
/// Length is proportional to the text so downstream timing still behaves
/// like speech.
#[derive(Debug, Clone)]
pub struct SilenceSynthesizer {
    sample_rate: u32,
    chunk_ms: u32,
    ms_per_char: u32,
}

impl SilenceSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        tracing::warn!("Using stub TTS backend - audio output will be silence");
        Self {
            sample_rate,
            chunk_ms: constants::effect::CHUNK_MS,
            ms_per_char: constants::audio::STUB_MS_PER_CHAR,
        }
    }

    fn render(&self, text: &str) -> Vec<AudioChunk> {
        let chars = text.chars().count() as u64;
        let total = chars * self.ms_per_char as u64 * self.sample_rate as u64 / 1000;
        AudioChunk::silence(self.sample_rate, total as usize).split(self.chunk_ms)
    }
}

impl Default for SilenceSynthesizer {
    fn default() -> Self {
        Self::new(constants::audio::SAMPLE_RATE)
    }
}

impl SpeechSynthesizer for SilenceSynthesizer {
    fn synthesize(&self, text: &str) -> AudioStream {
        Box::pin(stream::iter(self.render(text).into_iter().map(Ok)))
    }

    fn name(&self) -> &str {
        "silence"
    }
}
