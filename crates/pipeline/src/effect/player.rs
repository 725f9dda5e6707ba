use std::path::Path;
use std::sync::Arc;

use async_stream::stream;
use futures::stream::BoxStream;
use phone_agent_core::AudioChunk;

use super::loader::load_effect_chunks;
use crate::PipelineError;

/// Lazy sequence of effect audio
pub type EffectStream = BoxStream<'static, AudioChunk>;

/// Time cap for one effect playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectBudget {
    /// Playback stops once this much audio was emitted; `<= 0` disables
    pub max_duration_seconds: f64,
    /// Largest chunk emitted at once (ms)
    pub chunk_duration_ms: u32,
}

impl EffectBudget {
    pub fn new(max_duration_seconds: f64, chunk_duration_ms: u32) -> Self {
        Self {
            max_duration_seconds,
            chunk_duration_ms: chunk_duration_ms.max(1),
        }
    }

    pub fn is_disabled(&self) -> bool {
        // NaN counts as disabled
        !(self.max_duration_seconds > 0.0)
    }

    /// Total samples allowed at `sample_rate`
    pub fn sample_budget(&self, sample_rate: u32) -> usize {
        if self.is_disabled() {
            return 0;
        }
        (self.max_duration_seconds * sample_rate as f64).floor() as usize
    }
}

/// Streams a pre-loaded effect sound truncated to an [`EffectBudget`].
///
/// The source chunks are loaded once and never mutated; every call to
/// [`stream`](Self::stream) replays them from the start, so concurrent turns
/// can share one player behind an `Arc`.
#[derive(Debug, Clone)]
pub struct BoundedEffectPlayer {
    source: Arc<[AudioChunk]>,
}

impl BoundedEffectPlayer {
    pub fn new(source: Vec<AudioChunk>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Player without source material; every playback is empty
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Load the effect asset from a WAV file
    pub fn load(
        path: impl AsRef<Path>,
        target_rate: u32,
        chunk_ms: u32,
    ) -> Result<Self, PipelineError> {
        let chunks = load_effect_chunks(path.as_ref(), target_rate, chunk_ms)?;
        tracing::info!(
            path = %path.as_ref().display(),
            chunks = chunks.len(),
            "Loaded sound effect"
        );
        Ok(Self::new(chunks))
    }

    /// Play the effect, emitting at most `budget` worth of samples.
    ///
    /// The sample budget is fixed from the first source chunk's rate. A chunk
    /// crossing the budget is truncated to the remainder and playback stops
    /// there. Control is yielded to the scheduler between chunks.
    pub fn stream(&self, budget: EffectBudget) -> EffectStream {
        let source = Arc::clone(&self.source);

        Box::pin(stream! {
            if !budget.is_disabled() {
                let mut allowed: Option<usize> = None;
                let mut emitted = 0usize;

                'source: for chunk in source.iter() {
                    let allowed = *allowed.get_or_insert_with(|| budget.sample_budget(chunk.sample_rate()));

                    for piece in chunk.split(budget.chunk_duration_ms) {
                        if emitted >= allowed {
                            break 'source;
                        }
                        let remaining = allowed - emitted;
                        let piece = if piece.len() > remaining {
                            piece.truncated(remaining)
                        } else {
                            piece
                        };

                        emitted += piece.len();
                        yield piece;

                        if emitted >= allowed {
                            break 'source;
                        }
                        tokio::task::yield_now().await;
                    }
                }
            }
        })
    }
}
