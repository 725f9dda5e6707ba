use futures::stream::BoxStream;

use crate::{AudioChunk, SynthesisError};

/// Lazy sequence of synthesized audio
pub type AudioStream = BoxStream<'static, Result<AudioChunk, SynthesisError>>;

/// Text-to-speech collaborator
///
/// The returned stream owns everything it needs; dropping it mid-way must
/// release the backend's resources.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` as a stream of chunks
    fn synthesize(&self, text: &str) -> AudioStream;

    /// Backend name for logging
    fn name(&self) -> &str;
}
